//! Structured-block extraction and strict parsing of oracle responses.
//!
//! Responses are free text expected to contain one fenced JSON block,
//! usually wrapped in commentary. Malformed responses fail here and only
//! here, as a recoverable `ParseFailure`, so the fallback chain in `batch`
//! can react without the run aborting.

use adlens_core::CanonicalField;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap());

/// Recoverable parse failure: the response text was readable but did not
/// contain the expected structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub reason: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "oracle response parse failure: {}", self.reason)
    }
}

impl std::error::Error for ParseFailure {}

/// Locate the structured block: the first fenced code block if present,
/// otherwise the whole response.
pub fn extract_block(text: &str) -> &str {
    match JSON_FENCE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text.trim(),
    }
}

/// One classified keyword as the oracle reports it (keyword still in its
/// prompt-token string form).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawAssignment {
    pub keyword: String,
    pub axis_category: String,
    pub combination_category: String,
}

/// Parse a classification (or clustering) response into raw assignments.
pub fn parse_assignments(response: &str) -> Result<Vec<RawAssignment>, ParseFailure> {
    let block = extract_block(response);
    serde_json::from_str(block).map_err(|e| ParseFailure {
        reason: format!("{e}"),
    })
}

/// Parse a column-mapping response: a JSON object of source label to
/// canonical field name. Labels mapped to "unknown" or to unrecognized
/// field names are dropped rather than failing the whole response.
pub fn parse_mapping(response: &str) -> Result<HashMap<String, CanonicalField>, ParseFailure> {
    let block = extract_block(response);
    let raw: HashMap<String, String> = serde_json::from_str(block).map_err(|e| ParseFailure {
        reason: format!("{e}"),
    })?;

    Ok(raw
        .into_iter()
        .filter_map(|(label, field)| CanonicalField::from_name(&field).map(|f| (label, f)))
        .collect())
}
