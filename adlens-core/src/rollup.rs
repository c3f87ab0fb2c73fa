//! Category join and multi-dimensional rollups.
//!
//! Ratios are always recomputed from the summed bases, never averaged from
//! per-row values. Group maps are BTreeMaps so re-aggregating the same
//! input yields identical output.

use crate::metrics::{ratio_of_sums, round_percent};
use crate::record::{CategorizedRecord, CategoryAssignment, KeywordRecord, UNCATEGORIZED};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Summed metrics for one group, with ratios recomputed from the sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupTotals {
    pub keyword_count: usize,
    pub impressions: f64,
    pub clicks: f64,
    pub cost: f64,
    pub conversions: f64,
    pub ctr: Option<f64>,
    pub cvr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpa: Option<f64>,
    pub cpm: Option<f64>,
}

impl GroupTotals {
    fn absorb(&mut self, record: &KeywordRecord) {
        self.keyword_count += 1;
        self.impressions += record.impressions.unwrap_or(0.0);
        self.clicks += record.clicks.unwrap_or(0.0);
        self.cost += record.cost.unwrap_or(0.0);
        self.conversions += record.conversions.unwrap_or(0.0);
    }

    fn finalize(&mut self) {
        self.ctr = ratio_of_sums(self.clicks, self.impressions).map(round_percent);
        self.cvr = ratio_of_sums(self.conversions, self.clicks).map(round_percent);
        self.cpc = ratio_of_sums(self.cost, self.clicks).map(f64::round);
        self.cpa = ratio_of_sums(self.cost, self.conversions).map(f64::round);
        self.cpm = ratio_of_sums(self.cost, self.impressions).map(|v| (v * 1000.0).round());
    }
}

/// The five rollup tables consumed by the reporting layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStats {
    pub axis: BTreeMap<String, GroupTotals>,
    pub combination: BTreeMap<String, GroupTotals>,
    pub cross: BTreeMap<(String, String), GroupTotals>,
    pub match_type: BTreeMap<String, GroupTotals>,
    pub axis_match_type: BTreeMap<(String, String), GroupTotals>,
}

/// Join assignments back onto the full row set by keyword-value equality.
/// Rows with no matching assignment (outside the cost-priority selection,
/// or blank) get the "Uncategorized" pair.
pub fn join_assignments(
    records: &[KeywordRecord],
    assignments: &[CategoryAssignment],
) -> Vec<CategorizedRecord> {
    let by_token: HashMap<String, &CategoryAssignment> = assignments
        .iter()
        .map(|a| (a.keyword.prompt_token(), a))
        .collect();

    records
        .iter()
        .map(|record| {
            let found = (!record.keyword.is_blank())
                .then(|| by_token.get(&record.keyword.prompt_token()))
                .flatten();
            let (axis, combination) = match found {
                Some(a) => (a.axis_category.clone(), a.combination_category.clone()),
                None => (UNCATEGORIZED.to_string(), UNCATEGORIZED.to_string()),
            };
            CategorizedRecord {
                record: record.clone(),
                axis_category: axis,
                combination_category: combination,
            }
        })
        .collect()
}

/// Build all five rollup tables. Pure and idempotent.
pub fn aggregate(records: &[CategorizedRecord]) -> CategoryStats {
    let mut stats = CategoryStats::default();

    for cr in records {
        stats
            .axis
            .entry(cr.axis_category.clone())
            .or_default()
            .absorb(&cr.record);
        stats
            .combination
            .entry(cr.combination_category.clone())
            .or_default()
            .absorb(&cr.record);
        stats
            .cross
            .entry((cr.axis_category.clone(), cr.combination_category.clone()))
            .or_default()
            .absorb(&cr.record);
        stats
            .match_type
            .entry(cr.record.match_type.clone())
            .or_default()
            .absorb(&cr.record);
        stats
            .axis_match_type
            .entry((cr.axis_category.clone(), cr.record.match_type.clone()))
            .or_default()
            .absorb(&cr.record);
    }

    for totals in stats
        .axis
        .values_mut()
        .chain(stats.combination.values_mut())
        .chain(stats.cross.values_mut())
        .chain(stats.match_type.values_mut())
        .chain(stats.axis_match_type.values_mut())
    {
        totals.finalize();
    }

    stats
}
