//! Batched keyword classification with a three-tier fallback chain.
//!
//! Batches run strictly sequentially with an inter-batch delay; per-batch
//! failures degrade (classify -> cluster -> sentinel bucket) instead of
//! aborting, so a run always terminates with a full assignment set and a
//! diagnostic trail.

use crate::extract::parse_assignments;
use crate::oracle::Oracle;
use crate::prompts::{classify_prompt, cluster_prompt, CLASSIFY_SYSTEM, CLUSTER_SYSTEM};
use adlens_core::{CategoryAssignment, KeywordValue};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Hard ceiling on keywords per oracle request, regardless of config.
pub const MAX_BATCH_SIZE: usize = 100;

const DEFAULT_CLUSTER_HINT: usize = 5;

/// Bidirectional codec between keyword values and their prompt-token form.
/// Classification must not silently turn a numeric keyword into a string,
/// so decoding restores the original value for any token it encoded.
#[derive(Debug, Default)]
pub struct TokenCodec {
    originals: HashMap<String, KeywordValue>,
}

impl TokenCodec {
    /// Encode the non-blank keywords to unique prompt tokens, remembering
    /// the original value behind each token (first occurrence wins).
    pub fn encode(keywords: &[KeywordValue]) -> (Self, Vec<String>) {
        let mut codec = TokenCodec::default();
        let mut tokens = Vec::new();
        for kw in keywords {
            if kw.is_blank() {
                continue;
            }
            let token = kw.prompt_token();
            if !codec.originals.contains_key(&token) {
                codec.originals.insert(token.clone(), kw.clone());
                tokens.push(token);
            }
        }
        (codec, tokens)
    }

    /// Restore the original keyword value for a token the oracle echoed
    /// back. Tokens the codec never produced decode as plain text.
    pub fn decode(&self, token: &str) -> KeywordValue {
        self.originals
            .get(token)
            .cloned()
            .unwrap_or_else(|| KeywordValue::Text(token.to_string()))
    }

    pub fn knows(&self, token: &str) -> bool {
        self.originals.contains_key(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Primary classification parsed cleanly.
    Classified,
    /// Primary failed; the relaxed clustering request succeeded.
    RecoveredViaClustering,
    /// Both oracle attempts failed; the whole batch got the sentinel pair.
    SentinelFallback,
    /// Nothing valid to classify in the entire run.
    EmptyInput,
}

/// One diagnostic per batch. Degraded classification is expected and must
/// be visible, not fatal.
#[derive(Debug, Clone)]
pub struct BatchDiagnostic {
    pub batch_index: usize,
    pub keyword_count: usize,
    pub outcome: BatchOutcome,
    pub detail: Option<String>,
    /// Keywords already assigned by an earlier batch (first-seen-wins).
    pub duplicate_keywords: usize,
}

#[derive(Debug, Default)]
pub struct ClassificationRun {
    pub assignments: Vec<CategoryAssignment>,
    pub diagnostics: Vec<BatchDiagnostic>,
}

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub service_description: String,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            service_description: String::new(),
            batch_size: MAX_BATCH_SIZE,
            inter_batch_delay: Duration::from_millis(500),
        }
    }
}

/// Classify the selected keyword set batch by batch.
///
/// Every keyword in every batch ends up covered: by the primary
/// classification, by the clustering fallback, or by the sentinel pair.
/// Duplicate assignments across batches are dropped, first seen wins.
pub fn classify_keywords(
    oracle: &dyn Oracle,
    keywords: &[KeywordValue],
    options: &ClassifyOptions,
) -> ClassificationRun {
    let mut run = ClassificationRun::default();

    let (codec, tokens) = TokenCodec::encode(keywords);
    if tokens.is_empty() {
        run.diagnostics.push(BatchDiagnostic {
            batch_index: 0,
            keyword_count: 0,
            outcome: BatchOutcome::EmptyInput,
            detail: Some("no valid keywords to classify".to_string()),
            duplicate_keywords: 0,
        });
        return run;
    }

    let batch_size = options.batch_size.clamp(1, MAX_BATCH_SIZE);
    let batches: Vec<&[String]> = tokens.chunks(batch_size).collect();
    let mut assigned: HashSet<String> = HashSet::new();

    for (index, batch) in batches.iter().enumerate() {
        if index > 0 && !options.inter_batch_delay.is_zero() {
            std::thread::sleep(options.inter_batch_delay);
        }

        let mut diagnostic = run_batch(oracle, batch, options, index);

        // Apply first-seen-wins while restoring original keyword values.
        let mut duplicates = 0;
        for raw in diagnostic.1.drain(..) {
            if !codec.knows(&raw.keyword) {
                // The oracle invented or mangled a keyword; nothing to
                // attach it to.
                continue;
            }
            if !assigned.insert(raw.keyword.clone()) {
                duplicates += 1;
                continue;
            }
            run.assignments.push(CategoryAssignment {
                keyword: codec.decode(&raw.keyword),
                axis_category: raw.axis_category,
                combination_category: raw.combination_category,
            });
        }
        diagnostic.0.duplicate_keywords = duplicates;
        run.diagnostics.push(diagnostic.0);
    }

    run
}

/// Run one batch through the fallback chain, returning its diagnostic and
/// the raw (token-keyed) assignments to merge.
fn run_batch(
    oracle: &dyn Oracle,
    batch: &[String],
    options: &ClassifyOptions,
    index: usize,
) -> (BatchDiagnostic, Vec<crate::extract::RawAssignment>) {
    let diagnostic = |outcome, detail| BatchDiagnostic {
        batch_index: index,
        keyword_count: batch.len(),
        outcome,
        detail,
        duplicate_keywords: 0,
    };

    // Tier 1: primary classification.
    let primary_error = match oracle
        .complete(
            CLASSIFY_SYSTEM,
            &classify_prompt(batch, &options.service_description),
        )
        .and_then(|text| parse_assignments(&text).map_err(Into::into))
    {
        Ok(parsed) => return (diagnostic(BatchOutcome::Classified, None), parsed),
        Err(e) => format!("{e:#}"),
    };

    // Tier 2: relaxed clustering, a distinct prompt shape.
    let cluster_count = DEFAULT_CLUSTER_HINT.min((batch.len() / 5).max(2));
    let cluster_error = match oracle
        .complete(
            CLUSTER_SYSTEM,
            &cluster_prompt(batch, &options.service_description, cluster_count),
        )
        .and_then(|text| parse_assignments(&text).map_err(Into::into))
    {
        Ok(parsed) => {
            let detail = format!("classification failed ({primary_error}); recovered via clustering");
            return (
                diagnostic(BatchOutcome::RecoveredViaClustering, Some(detail)),
                parsed,
            );
        }
        Err(e) => format!("{e:#}"),
    };

    // Tier 3: sentinel bucket for the whole batch.
    let sentinel = batch
        .iter()
        .map(|token| crate::extract::RawAssignment {
            keyword: token.clone(),
            axis_category: adlens_core::UNCLASSIFIED_GROUP.to_string(),
            combination_category: adlens_core::AUTO_ASSIGNED.to_string(),
        })
        .collect();
    let detail = format!(
        "classification failed ({primary_error}); clustering failed ({cluster_error})"
    );
    (
        diagnostic(BatchOutcome::SentinelFallback, Some(detail)),
        sentinel,
    )
}
