//! adlens-classify: oracle client, prompt construction, structured-block
//! extraction, batched keyword classification with fallback, and narrative
//! report generation.

pub mod batch;
pub mod extract;
pub mod mapping;
pub mod oracle;
pub mod prompts;
pub mod report;

pub use batch::{
    classify_keywords, BatchDiagnostic, BatchOutcome, ClassificationRun, ClassifyOptions,
    TokenCodec, MAX_BATCH_SIZE,
};
pub use extract::{extract_block, parse_assignments, parse_mapping, ParseFailure};
pub use mapping::suggest_mapping;
pub use oracle::{OpenAiOracle, Oracle, OracleConfig};
pub use report::generate_report;
