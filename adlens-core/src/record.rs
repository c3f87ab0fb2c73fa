//! Record types flowing through the analysis pipeline.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Join-time default for keywords no assignment covers.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Axis half of the sentinel pair assigned when every oracle attempt fails.
pub const UNCLASSIFIED_GROUP: &str = "UnclassifiedGroup";
/// Combination half of the sentinel pair.
pub const AUTO_ASSIGNED: &str = "AutoAssigned";

/// A keyword cell as it appeared in the source sheet.
///
/// Sheets occasionally carry purely numeric keywords (model numbers, zip
/// codes). They must survive the round trip through prompt text without
/// being silently turned into strings, so the original variant is kept and
/// a canonical token form is used for prompting and matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordValue {
    Number(f64),
    Text(String),
}

impl KeywordValue {
    /// Canonical string form used in prompts and for equality/joins.
    /// Whole numbers render without a trailing `.0` so they match what the
    /// oracle echoes back.
    pub fn prompt_token(&self) -> String {
        match self {
            KeywordValue::Text(s) => s.clone(),
            KeywordValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// Blank keywords are skipped by selection and classified as
    /// uncategorized at join time.
    pub fn is_blank(&self) -> bool {
        match self {
            KeywordValue::Text(s) => s.trim().is_empty(),
            KeywordValue::Number(n) => !n.is_finite(),
        }
    }
}

impl PartialEq for KeywordValue {
    fn eq(&self, other: &Self) -> bool {
        self.prompt_token() == other.prompt_token()
    }
}

impl Eq for KeywordValue {}

impl Hash for KeywordValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.prompt_token().hash(state);
    }
}

impl std::fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prompt_token())
    }
}

impl From<&str> for KeywordValue {
    fn from(s: &str) -> Self {
        KeywordValue::Text(s.to_string())
    }
}

/// One row of the uploaded sheet, untyped: ordered (label, cell) pairs.
/// Constructed once at ingestion, read-only, discarded after mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub cells: Vec<(String, String)>,
}

impl RawRecord {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Per-row derived ratios. `None` is the explicit "undefined" marker for
/// division by zero or by a missing denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ctr: Option<f64>,
    pub cvr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpa: Option<f64>,
    pub cpm: Option<f64>,
}

/// One canonicalized row. Base numerics are `None` when the source cell was
/// unparseable or negative; that propagates as undefined derived metrics
/// rather than an error. Never mutated after derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: KeywordValue,
    pub match_type: String,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub cost: Option<f64>,
    pub conversions: Option<f64>,
    pub campaign_name: Option<String>,
    pub ad_group_name: Option<String>,
    pub metrics: DerivedMetrics,
}

impl KeywordRecord {
    pub fn new(keyword: KeywordValue, match_type: impl Into<String>) -> Self {
        Self {
            keyword,
            match_type: match_type.into(),
            impressions: None,
            clicks: None,
            cost: None,
            conversions: None,
            campaign_name: None,
            ad_group_name: None,
            metrics: DerivedMetrics::default(),
        }
    }
}

/// One classification outcome per distinct keyword value. Identical keyword
/// strings across rows share one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub keyword: KeywordValue,
    pub axis_category: String,
    pub combination_category: String,
}

impl CategoryAssignment {
    /// The pair assigned when both oracle attempts fail for a batch.
    pub fn sentinel(keyword: KeywordValue) -> Self {
        Self {
            keyword,
            axis_category: UNCLASSIFIED_GROUP.to_string(),
            combination_category: AUTO_ASSIGNED.to_string(),
        }
    }
}

/// A keyword record with its resolved categories, input to all rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedRecord {
    pub record: KeywordRecord,
    pub axis_category: String,
    pub combination_category: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_numeric_token_has_no_trailing_zero() {
        assert_eq!(KeywordValue::Number(12345.0).prompt_token(), "12345");
        assert_eq!(KeywordValue::Number(1.5).prompt_token(), "1.5");
        assert_eq!(KeywordValue::Text("渋谷 賃貸".into()).prompt_token(), "渋谷 賃貸");
    }

    #[test]
    fn test_numeric_and_text_forms_join() {
        // An oracle echoes "90210" back as text; it must still match the
        // numeric original in a map keyed by KeywordValue.
        let mut map: HashMap<KeywordValue, &str> = HashMap::new();
        map.insert(KeywordValue::Number(90210.0), "matched");
        assert_eq!(map.get(&KeywordValue::from("90210")), Some(&"matched"));
    }

    #[test]
    fn test_blankness() {
        assert!(KeywordValue::from("   ").is_blank());
        assert!(!KeywordValue::from("a").is_blank());
        assert!(!KeywordValue::Number(0.0).is_blank());
        assert!(KeywordValue::Number(f64::NAN).is_blank());
    }

    #[test]
    fn test_keyword_value_serde_is_untagged() {
        let parsed: Vec<KeywordValue> = serde_json::from_str(r#"["tokyo rent", 90210]"#).unwrap();
        assert_eq!(parsed[0], KeywordValue::from("tokyo rent"));
        assert!(matches!(parsed[1], KeywordValue::Number(n) if n == 90210.0));
        assert_eq!(serde_json::to_string(&parsed[1]).unwrap(), "90210.0");
    }

    #[test]
    fn test_raw_record_lookup() {
        let rec = RawRecord {
            cells: vec![
                ("kw".to_string(), "rent tokyo".to_string()),
                ("imp".to_string(), "1,200".to_string()),
            ],
        };
        assert_eq!(rec.get("imp"), Some("1,200"));
        assert_eq!(rec.get("missing"), None);
    }
}
