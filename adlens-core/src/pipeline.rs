//! Explicit pipeline state threaded through the analysis stages.
//!
//! Each stage consumes the prior state and returns a new one; no stage
//! mutates another's output in place, so every stage stays testable as a
//! pure function of its input.

use crate::metrics::derive_metrics;
use crate::record::{CategorizedRecord, CategoryAssignment, KeywordRecord, KeywordValue};
use crate::rollup::{aggregate, join_assignments, CategoryStats};
use crate::selector::select_by_cost;

/// Session-scoped dataset state, replaced wholesale at stage boundaries.
#[derive(Debug, Clone, Default)]
pub struct AnalysisState {
    pub records: Vec<KeywordRecord>,
    pub selection: Vec<KeywordValue>,
    pub assignments: Vec<CategoryAssignment>,
    pub categorized: Vec<CategorizedRecord>,
    pub stats: Option<CategoryStats>,
}

impl AnalysisState {
    /// Seed the pipeline with canonicalized rows; derived metrics are
    /// (re)computed here so records are never half-derived.
    pub fn from_records(mut records: Vec<KeywordRecord>) -> Self {
        for record in &mut records {
            record.metrics = derive_metrics(record);
        }
        Self {
            records,
            ..Default::default()
        }
    }

    /// Stage: cost-priority selection of the classification working set.
    pub fn with_selection(mut self, cost_threshold_percent: f64) -> Self {
        self.selection = select_by_cost(&self.records, cost_threshold_percent);
        self
    }

    /// Stage: attach the classifier's assignment set.
    pub fn with_assignments(mut self, assignments: Vec<CategoryAssignment>) -> Self {
        self.assignments = assignments;
        self
    }

    /// Stage: join assignments onto all rows and build the rollups.
    pub fn with_rollups(mut self) -> Self {
        self.categorized = join_assignments(&self.records, &self.assignments);
        self.stats = Some(aggregate(&self.categorized));
        self
    }

    /// Dataset summary printed after mapping application.
    pub fn totals(&self) -> (usize, f64, f64, f64) {
        let cost = self.records.iter().filter_map(|r| r.cost).sum();
        let clicks = self.records.iter().filter_map(|r| r.clicks).sum();
        let conversions = self.records.iter().filter_map(|r| r.conversions).sum();
        (self.records.len(), cost, clicks, conversions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{KeywordValue, UNCATEGORIZED};

    fn record(kw: &str, cost: f64, clicks: f64) -> KeywordRecord {
        let mut r = KeywordRecord::new(KeywordValue::from(kw), "exact");
        r.impressions = Some(1000.0);
        r.clicks = Some(clicks);
        r.cost = Some(cost);
        r.conversions = Some(1.0);
        r
    }

    #[test]
    fn test_stages_replace_state_wholesale() {
        let state = AnalysisState::from_records(vec![record("a", 100.0, 10.0), record("b", 20.0, 5.0)]);
        assert!(state.records[0].metrics.ctr.is_some());

        let state = state.with_selection(100.0);
        assert_eq!(state.selection.len(), 2);

        let state = state
            .with_assignments(vec![CategoryAssignment {
                keyword: KeywordValue::from("a"),
                axis_category: "Core".to_string(),
                combination_category: "Intent".to_string(),
            }])
            .with_rollups();

        let stats = state.stats.as_ref().unwrap();
        assert!(stats.axis.contains_key("Core"));
        assert!(stats.axis.contains_key(UNCATEGORIZED));
        assert_eq!(state.categorized.len(), 2);
    }

    #[test]
    fn test_totals() {
        let state = AnalysisState::from_records(vec![record("a", 100.0, 10.0), record("b", 20.0, 5.0)]);
        let (rows, cost, clicks, conversions) = state.totals();
        assert_eq!(rows, 2);
        assert_eq!(cost, 120.0);
        assert_eq!(clicks, 15.0);
        assert_eq!(conversions, 2.0);
    }
}
