//! The oracle boundary: an external language-model service reached over an
//! OpenAI-compatible chat-completions API.
//!
//! Everything above this module sees only `Oracle`: one call in, opaque
//! response text out. Parsing of that text happens in `extract`, nowhere
//! else.

use anyhow::{bail, Context, Result};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

/// Capability handle for the external classification service.
pub trait Oracle {
    /// One completion round-trip: system role text plus a user prompt,
    /// returning the raw response text.
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

pub struct OpenAiOracle {
    config: OracleConfig,
}

impl OpenAiOracle {
    /// Refuses construction without a credential so oracle-dependent
    /// operations fail before any state is touched.
    pub fn new(config: OracleConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!("missing oracle API key; set it in the config or OPENAI_API_KEY");
        }
        Ok(Self { config })
    }
}

impl Oracle for OpenAiOracle {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        // Callers may already be inside a tokio runtime (the CLI is
        // #[tokio::main]); a nested Runtime::block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| {
                handle.block_on(async { complete_async(&self.config, system, prompt).await })
            })
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(async { complete_async(&self.config, system, prompt).await })
        }
    }
}

async fn complete_async(config: &OracleConfig, system: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Msg {
        role: String,
        content: String,
    }

    #[derive(Serialize)]
    struct Req {
        model: String,
        messages: Vec<Msg>,
        temperature: f32,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }

    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    let body = Req {
        model: config.model.clone(),
        messages: vec![
            Msg {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Msg {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ],
        temperature: config.temperature,
    };

    let url = format!(
        "{}/v1/chat/completions",
        config.base_url.trim_end_matches('/')
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .header(AUTHORIZATION, format!("Bearer {}", config.api_key))
        .json(&body)
        .send()
        .await
        .context("oracle request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("oracle error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse oracle response envelope")?;
    let content = out
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();

    Ok(content.trim().to_string())
}
