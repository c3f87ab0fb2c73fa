//! Narrative report generation from the rollup tables.
//!
//! The rollups are rendered into a plain-text digest, handed to the oracle
//! with the report prompt, and the response comes back as an opaque text
//! blob for the rendering layer.

use crate::oracle::Oracle;
use crate::prompts::{report_prompt, REPORT_SYSTEM};
use adlens_core::{CategoryStats, GroupTotals};
use anyhow::Result;
use std::collections::BTreeMap;

const TOP_ROWS: usize = 10;
const EFFICIENCY_ROWS: usize = 3;
const MIN_CONVERSIONS_FOR_RANKING: f64 = 5.0;

/// Generate the analysis report. One oracle call; errors propagate to the
/// caller since there is no degraded form of a narrative report.
pub fn generate_report(
    oracle: &dyn Oracle,
    stats: &CategoryStats,
    service_description: &str,
) -> Result<String> {
    let digest = render_digest(stats);
    oracle.complete(REPORT_SYSTEM, &report_prompt(&digest, service_description))
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn render_rows(rows: &[(&String, &GroupTotals)]) -> String {
    let mut out = String::new();
    for (name, g) in rows {
        out.push_str(&format!(
            "{name}: keywords={} impressions={:.0} clicks={:.0} cost={:.0} conversions={:.0} ctr={} cvr={} cpc={} cpa={}\n",
            g.keyword_count,
            g.impressions,
            g.clicks,
            g.cost,
            g.conversions,
            fmt_opt(g.ctr),
            fmt_opt(g.cvr),
            fmt_opt(g.cpc),
            fmt_opt(g.cpa),
        ));
    }
    out
}

fn top_by_cost(table: &BTreeMap<String, GroupTotals>, limit: usize) -> Vec<(&String, &GroupTotals)> {
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|a, b| b.1.cost.total_cmp(&a.1.cost));
    rows.truncate(limit);
    rows
}

/// Axis categories with enough conversions to rank, ordered by CPA.
fn rank_by_cpa(table: &BTreeMap<String, GroupTotals>, ascending: bool) -> Vec<(&String, &GroupTotals)> {
    let mut rows: Vec<_> = table
        .iter()
        .filter(|(_, g)| g.conversions >= MIN_CONVERSIONS_FOR_RANKING && g.cpa.is_some())
        .collect();
    rows.sort_by(|a, b| {
        let (x, y) = (a.1.cpa.unwrap_or(f64::MAX), b.1.cpa.unwrap_or(f64::MAX));
        if ascending { x.total_cmp(&y) } else { y.total_cmp(&x) }
    });
    rows.truncate(EFFICIENCY_ROWS);
    rows
}

fn render_digest(stats: &CategoryStats) -> String {
    let match_type_rows: Vec<_> = stats.match_type.iter().collect();
    format!(
        "===== Axis category performance (top {TOP_ROWS} by cost) =====\n{}\n\
         ===== Combination category performance (top {TOP_ROWS} by cost) =====\n{}\n\
         ===== Match type performance =====\n{}\n\
         ===== High-efficiency axis categories (lowest CPA) =====\n{}\n\
         ===== Low-efficiency axis categories (highest CPA) =====\n{}\n",
        render_rows(&top_by_cost(&stats.axis, TOP_ROWS)),
        render_rows(&top_by_cost(&stats.combination, TOP_ROWS)),
        render_rows(&match_type_rows),
        render_rows(&rank_by_cpa(&stats.axis, true)),
        render_rows(&rank_by_cpa(&stats.axis, false)),
    )
}
