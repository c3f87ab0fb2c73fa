//! Cost-priority selection of the keyword working set.
//!
//! Oracle classification is billed per keyword, so only the spend-dominant
//! subset is sent: rows sorted by cost descending, kept while their
//! cumulative share of total cost stays within the configured threshold.
//! This is a cost-control policy, not an accuracy one.

use crate::record::{KeywordRecord, KeywordValue};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Select the unique, non-blank keywords whose rows cover up to
/// `cost_threshold_percent` of total spend.
///
/// Ties in cost keep original row order (stable sort). The top-cost row is
/// always included, so a non-empty input never selects nothing. Missing
/// costs sort and accumulate as zero. Pure function of its inputs.
pub fn select_by_cost(records: &[KeywordRecord], cost_threshold_percent: f64) -> Vec<KeywordValue> {
    let total: f64 = records.iter().filter_map(|r| r.cost).sum();

    let mut ordered: Vec<&KeywordRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        b.cost
            .unwrap_or(0.0)
            .partial_cmp(&a.cost.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });

    let mut cumulative = 0.0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut selected = Vec::new();

    for (i, record) in ordered.iter().enumerate() {
        cumulative += record.cost.unwrap_or(0.0);
        let percent = if total > 0.0 {
            cumulative / total * 100.0
        } else {
            100.0
        };
        if i > 0 && percent > cost_threshold_percent {
            // Cumulative percent is monotone from here on.
            break;
        }
        if record.keyword.is_blank() {
            continue;
        }
        if seen.insert(record.keyword.prompt_token()) {
            selected.push(record.keyword.clone());
        }
    }

    selected
}
