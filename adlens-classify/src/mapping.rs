//! Oracle-backed column-mapping suggestion.
//!
//! One call covers every label. Any failure (request, parse) is returned as
//! an error for the resolver to catch and fall back on; it never blocks the
//! pipeline.

use crate::extract::parse_mapping;
use crate::oracle::Oracle;
use crate::prompts::{mapping_prompt, MAPPING_SYSTEM};
use adlens_core::CanonicalField;
use anyhow::Result;
use std::collections::HashMap;

/// Ask the oracle to map every source label to a canonical field in a
/// single request.
pub fn suggest_mapping(
    oracle: &dyn Oracle,
    labels: &[String],
) -> Result<HashMap<String, CanonicalField>> {
    let response = oracle.complete(MAPPING_SYSTEM, &mapping_prompt(labels))?;
    Ok(parse_mapping(&response)?)
}
