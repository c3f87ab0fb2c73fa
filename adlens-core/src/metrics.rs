//! Numeric cleaning and derived metric computation.
//!
//! Sheets arrive with formatted numerics ("1,234", "¥5,600"). Cells are
//! cleaned before parsing; anything unparseable or negative becomes `None`
//! and flows through as an undefined metric, never an error.

use crate::record::{DerivedMetrics, KeywordRecord};
use regex::Regex;
use std::sync::LazyLock;

static STRIP_FORMATTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,¥$€£%\s　]").unwrap());

/// Parse a formatted numeric cell. Returns `None` for blank, unparseable,
/// non-finite, or negative values.
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned = STRIP_FORMATTING.replace_all(trimmed, "");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value)
}

/// Numerator over denominator, undefined when either side is missing or the
/// denominator is zero. Never infinity, never NaN.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;
    if d > 0.0 { Some(n / d) } else { None }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute the five standard ratios for one record.
///
/// Percentages round to 2 decimals, currency ratios to whole units,
/// matching how the figures are shown downstream.
pub fn derive_metrics(record: &KeywordRecord) -> DerivedMetrics {
    DerivedMetrics {
        ctr: ratio(record.clicks, record.impressions).map(|v| round2(v * 100.0)),
        cvr: ratio(record.conversions, record.clicks).map(|v| round2(v * 100.0)),
        cpc: ratio(record.cost, record.clicks).map(f64::round),
        cpa: ratio(record.cost, record.conversions).map(f64::round),
        cpm: ratio(record.cost, record.impressions).map(|v| (v * 1000.0).round()),
    }
}

/// Ratio over already-summed group totals, used by the rollups. Sums are
/// plain f64 (missing bases contributed zero weight), so only the zero
/// denominator needs guarding.
pub(crate) fn ratio_of_sums(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

pub(crate) fn round_percent(v: f64) -> f64 {
    round2(v * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{KeywordRecord, KeywordValue};

    fn record(imp: Option<f64>, clicks: Option<f64>, cost: Option<f64>, conv: Option<f64>) -> KeywordRecord {
        let mut r = KeywordRecord::new(KeywordValue::from("kw"), "exact");
        r.impressions = imp;
        r.clicks = clicks;
        r.cost = cost;
        r.conversions = conv;
        r
    }

    #[test]
    fn test_clean_numeric_formatted() {
        assert_eq!(clean_numeric("1,234"), Some(1234.0));
        assert_eq!(clean_numeric("¥24,000"), Some(24000.0));
        assert_eq!(clean_numeric(" 12.5 "), Some(12.5));
        assert_eq!(clean_numeric("$1,000.50"), Some(1000.5));
    }

    #[test]
    fn test_clean_numeric_invalid() {
        assert_eq!(clean_numeric(""), None);
        assert_eq!(clean_numeric("n/a"), None);
        assert_eq!(clean_numeric("-5"), None);
        assert_eq!(clean_numeric("1.2.3"), None);
    }

    #[test]
    fn test_derive_basic() {
        let m = derive_metrics(&record(Some(1200.0), Some(120.0), Some(24000.0), Some(5.0)));
        assert_eq!(m.ctr, Some(10.0));
        assert_eq!(m.cvr, Some(4.17));
        assert_eq!(m.cpc, Some(200.0));
        assert_eq!(m.cpa, Some(4800.0));
        assert_eq!(m.cpm, Some(20000.0));
    }

    #[test]
    fn test_zero_clicks_defined_ctr_undefined_cvr_cpc() {
        let m = derive_metrics(&record(Some(500.0), Some(0.0), Some(300.0), Some(0.0)));
        assert_eq!(m.ctr, Some(0.0));
        assert_eq!(m.cvr, None);
        assert_eq!(m.cpc, None);
        assert_eq!(m.cpa, None);
        assert_eq!(m.cpm, Some(600.0));
    }

    #[test]
    fn test_missing_inputs_propagate_as_undefined() {
        let m = derive_metrics(&record(None, Some(10.0), None, Some(1.0)));
        assert_eq!(m.ctr, None);
        assert_eq!(m.cpm, None);
        assert_eq!(m.cpa, None);
        assert_eq!(m.cvr, Some(10.0));
    }
}
