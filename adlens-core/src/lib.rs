//! adlens-core: canonical schema, keyword records, derived metrics,
//! cost-priority selection, and category rollups for keyword analysis.

pub mod fields;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod rollup;
pub mod selector;

pub use fields::CanonicalField;
pub use metrics::{clean_numeric, derive_metrics};
pub use pipeline::AnalysisState;
pub use record::{
    CategorizedRecord, CategoryAssignment, DerivedMetrics, KeywordRecord, KeywordValue, RawRecord,
    AUTO_ASSIGNED, UNCATEGORIZED, UNCLASSIFIED_GROUP,
};
pub use rollup::{aggregate, join_assignments, CategoryStats, GroupTotals};
pub use selector::select_by_cost;
