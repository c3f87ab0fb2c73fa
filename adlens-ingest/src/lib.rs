//! adlens-ingest: sheet parsing into raw records, column-label resolution
//! onto the canonical schema, mapping application, and categorized-dataset
//! export.

pub mod export;
pub mod resolver;
pub mod sheet;

pub use export::{export_categorized, export_categorized_to_path, filter_by_category};
pub use resolver::{resolve, ColumnMapping, ResolverDiagnostics, SuggestedMapping, FUZZY_THRESHOLD};
pub use sheet::{parse_sheet, parse_sheet_from_reader, Sheet};
