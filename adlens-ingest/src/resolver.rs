//! Column-label resolution onto the canonical schema.
//!
//! Per label, in priority order: exact canonical-name match, alias
//! substring match, fuzzy similarity above threshold, Unknown. An optional
//! oracle suggestion overlays the rule result but never blocks it. The
//! suggested mapping only seeds a reviewable default; rows are projected
//! only through a confirmed, injective mapping.

use adlens_classify::{suggest_mapping, Oracle};
use adlens_core::{clean_numeric, CanonicalField, KeywordRecord, KeywordValue, RawRecord};
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Fuzzy-similarity acceptance threshold. A configuration default, not a
/// tuned value.
pub const FUZZY_THRESHOLD: f64 = 0.7;

/// What happened while resolving, for display alongside the suggestion.
#[derive(Debug, Clone, Default)]
pub struct ResolverDiagnostics {
    /// The oracle suggestion was fetched and overlaid.
    pub oracle_used: bool,
    /// Why the oracle overlay was skipped, if it was attempted.
    pub oracle_error: Option<String>,
    /// Labels that resolved to Unknown.
    pub unresolved: Vec<String>,
    /// Required fields no label resolved to.
    pub missing_required: Vec<CanonicalField>,
}

/// The reviewable default produced by `resolve`. `None` = Unknown.
#[derive(Debug, Clone)]
pub struct SuggestedMapping {
    pub by_label: HashMap<String, Option<CanonicalField>>,
    pub diagnostics: ResolverDiagnostics,
}

/// Resolve every label. With an oracle handle, a valid oracle mapping takes
/// precedence for the labels it covers; any oracle failure falls back
/// entirely to the rule-based result.
pub fn resolve(labels: &[String], oracle: Option<&dyn Oracle>) -> SuggestedMapping {
    let mut by_label: HashMap<String, Option<CanonicalField>> = labels
        .iter()
        .map(|label| (label.clone(), resolve_one(label)))
        .collect();

    let mut diagnostics = ResolverDiagnostics::default();

    if let Some(oracle) = oracle {
        match suggest_mapping(oracle, labels) {
            Ok(suggested) => {
                diagnostics.oracle_used = true;
                for (label, field) in suggested {
                    if by_label.contains_key(&label) {
                        by_label.insert(label, Some(field));
                    }
                }
            }
            Err(e) => diagnostics.oracle_error = Some(format!("{e:#}")),
        }
    }

    diagnostics.unresolved = labels
        .iter()
        .filter(|l| by_label.get(*l).is_none_or(|f| f.is_none()))
        .cloned()
        .collect();
    diagnostics.missing_required = CanonicalField::REQUIRED
        .into_iter()
        .filter(|f| !by_label.values().any(|v| v == &Some(*f)))
        .collect();

    SuggestedMapping {
        by_label,
        diagnostics,
    }
}

/// Rule chain for one label.
fn resolve_one(label: &str) -> Option<CanonicalField> {
    let lower = label.trim().to_lowercase();

    // 1. Exact canonical-name match.
    for field in CanonicalField::ALL {
        if lower == field.name().to_lowercase() {
            return Some(field);
        }
    }

    // 2. Alias substring match.
    for field in CanonicalField::ALL {
        for alias in field.aliases() {
            if lower.contains(&alias.to_lowercase()) {
                return Some(field);
            }
        }
    }

    // 3. Fuzzy similarity against names and aliases; ties break toward the
    //    first-enumerated field because only strictly better scores win.
    let mut best: Option<CanonicalField> = None;
    let mut best_score = FUZZY_THRESHOLD;
    for field in CanonicalField::ALL {
        let candidates = std::iter::once(field.name()).chain(field.aliases().iter().copied());
        for candidate in candidates {
            let score = strsim::normalized_levenshtein(&lower, &candidate.to_lowercase());
            if score > best_score {
                best = Some(field);
                best_score = score;
            }
        }
    }
    best
}

/// Human-confirmed selection: one source label per canonical field.
/// Immutable once applied; application either projects every row or fails
/// wholesale naming the missing required fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    by_field: HashMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a confirmed mapping from the suggestion: for each field, the
    /// first label (in header order) that resolved to it.
    pub fn from_suggestion(labels: &[String], suggestion: &SuggestedMapping) -> Self {
        let mut mapping = Self::new();
        for field in CanonicalField::ALL {
            if let Some(label) = labels
                .iter()
                .find(|l| suggestion.by_label.get(*l) == Some(&Some(field)))
            {
                mapping.set(field, label.clone());
            }
        }
        mapping
    }

    /// Override or add one field's source column.
    pub fn set(&mut self, field: CanonicalField, label: String) {
        // Keep the mapping injective: drop any other field claiming the
        // same source label.
        self.by_field.retain(|_, l| *l != label);
        self.by_field.insert(field, label);
    }

    pub fn source(&self, field: CanonicalField) -> Option<&str> {
        self.by_field.get(&field).map(String::as_str)
    }

    /// Required fields with no confirmed source column.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .into_iter()
            .filter(|f| !self.by_field.contains_key(f))
            .collect()
    }

    /// Project raw rows into canonical keyword records. Refused entirely if
    /// any required field is unmapped.
    pub fn apply(&self, rows: &[RawRecord]) -> Result<Vec<KeywordRecord>> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
            bail!("required fields not mapped: {}", names.join(", "));
        }

        let cell = |row: &RawRecord, field: CanonicalField| -> String {
            self.source(field)
                .and_then(|label| row.get(label))
                .unwrap_or("")
                .to_string()
        };

        Ok(rows
            .iter()
            .map(|row| {
                let keyword_cell = cell(row, CanonicalField::Keyword);
                // Purely numeric keywords keep their numeric identity so the
                // classifier can restore it after prompting.
                let keyword = match keyword_cell.parse::<f64>() {
                    Ok(n) if n.is_finite() && !keyword_cell.is_empty() => KeywordValue::Number(n),
                    _ => KeywordValue::Text(keyword_cell),
                };

                let mut record = KeywordRecord::new(keyword, cell(row, CanonicalField::MatchType));
                record.impressions = clean_numeric(&cell(row, CanonicalField::Impressions));
                record.clicks = clean_numeric(&cell(row, CanonicalField::Clicks));
                record.cost = clean_numeric(&cell(row, CanonicalField::Cost));
                record.conversions = clean_numeric(&cell(row, CanonicalField::Conversions));
                record.campaign_name = optional_cell(&cell(row, CanonicalField::CampaignName));
                record.ad_group_name = optional_cell(&cell(row, CanonicalField::AdGroupName));
                record
            })
            .collect())
    }
}

fn optional_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
