use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use adlens_classify::OracleConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub oracle: OracleSection,
    pub analysis: AnalysisSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSection {
    /// Falls back to the OPENAI_API_KEY environment variable when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Share of total spend the classified working set must cover (50-100).
    pub cost_threshold_percent: f64,
    /// Configured batch size (50-500); clamped again to 100 at request time.
    pub max_keywords_per_batch: usize,
    /// Minimum group cost for the low-efficiency shortlist.
    pub min_cost_threshold: f64,
    /// Minimum clicks for per-keyword performance views.
    pub min_clicks: f64,
    /// Free text passed verbatim into oracle prompts.
    pub service_description: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle: OracleSection {
                api_key: None,
                model: "gpt-4-turbo".to_string(),
                base_url: "https://api.openai.com".to_string(),
                temperature: 0.3,
            },
            analysis: AnalysisSection {
                cost_threshold_percent: 80.0,
                max_keywords_per_batch: 100,
                min_cost_threshold: 1000.0,
                min_clicks: 10.0,
                service_description: String::new(),
            },
        }
    }
}

impl Config {
    /// Pull out-of-range values back into their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.analysis.cost_threshold_percent = self.analysis.cost_threshold_percent.clamp(50.0, 100.0);
        self.analysis.max_keywords_per_batch = self.analysis.max_keywords_per_batch.clamp(50, 500);
        self
    }

    /// Config value first, environment second.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.oracle
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()))
    }

    pub fn oracle_config(&self) -> Result<OracleConfig> {
        Ok(OracleConfig {
            api_key: self.resolve_api_key().unwrap_or_default(),
            model: self.oracle.model.clone(),
            base_url: self.oracle.base_url.clone(),
            temperature: self.oracle.temperature,
        })
    }
}

fn ensure_adlens_home() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")?;
    let dir = home.join(".adlens");
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_adlens_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    Ok(cfg.clamped())
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
