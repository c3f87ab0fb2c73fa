//! Export of the categorized dataset as delimited text.
//!
//! UTF-8 CSV, header = canonical field names + derived metrics + the two
//! category columns. The output re-parses through `sheet::parse_sheet`, so
//! exports can be fed back in for a second pass.

use adlens_core::{CanonicalField, CategorizedRecord};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

const DERIVED_COLUMNS: [&str; 5] = ["CTR", "CVR", "CPC", "CPA", "CPM"];
const CATEGORY_COLUMNS: [&str; 2] = ["AxisCategory", "CombinationCategory"];

fn fmt_num(v: Option<f64>) -> String {
    match v {
        Some(v) => {
            if v.fract() == 0.0 {
                format!("{}", v as i64)
            } else {
                format!("{v}")
            }
        }
        None => String::new(),
    }
}

/// Write the categorized dataset to any writer.
pub fn export_categorized<W: Write>(records: &[CategorizedRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = CanonicalField::ALL
        .iter()
        .map(|f| f.name())
        .chain(DERIVED_COLUMNS)
        .chain(CATEGORY_COLUMNS)
        .collect();
    wtr.write_record(&header)?;

    for cr in records {
        let r = &cr.record;
        wtr.write_record([
            r.keyword.prompt_token(),
            r.match_type.clone(),
            fmt_num(r.impressions),
            fmt_num(r.clicks),
            fmt_num(r.cost),
            fmt_num(r.conversions),
            r.campaign_name.clone().unwrap_or_default(),
            r.ad_group_name.clone().unwrap_or_default(),
            fmt_num(r.metrics.ctr),
            fmt_num(r.metrics.cvr),
            fmt_num(r.metrics.cpc),
            fmt_num(r.metrics.cpa),
            fmt_num(r.metrics.cpm),
            cr.axis_category.clone(),
            cr.combination_category.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_categorized_to_path(
    records: &[CategorizedRecord],
    path: impl AsRef<Path>,
) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    export_categorized(records, file)
}

/// Subset by category, matching the detail-exploration filters. Empty
/// filter lists keep everything on that dimension.
pub fn filter_by_category(
    records: &[CategorizedRecord],
    axis: &[String],
    combination: &[String],
) -> Vec<CategorizedRecord> {
    records
        .iter()
        .filter(|cr| axis.is_empty() || axis.contains(&cr.axis_category))
        .filter(|cr| combination.is_empty() || combination.contains(&cr.combination_category))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ColumnMapping;
    use crate::sheet::parse_sheet_from_reader;
    use adlens_core::{derive_metrics, KeywordRecord, KeywordValue};

    fn categorized(kw: &str, axis: &str, combo: &str, cost: f64) -> CategorizedRecord {
        let mut r = KeywordRecord::new(KeywordValue::from(kw), "exact");
        r.impressions = Some(1000.0);
        r.clicks = Some(100.0);
        r.cost = Some(cost);
        r.conversions = Some(2.0);
        r.metrics = derive_metrics(&r);
        CategorizedRecord {
            record: r,
            axis_category: axis.to_string(),
            combination_category: combo.to_string(),
        }
    }

    #[test]
    fn test_export_header_shape() {
        let mut out = Vec::new();
        export_categorized(&[categorized("a", "Core", "Intent", 10.0)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Keyword,MatchType,Impressions,Clicks,Cost,Conversions,CampaignName,AdGroupName,CTR,CVR,CPC,CPA,CPM,AxisCategory,CombinationCategory"
        );
    }

    #[test]
    fn test_round_trip_preserves_rows_and_total_cost() {
        let records = vec![
            categorized("渋谷 賃貸", "Rent", "Area", 24000.0),
            categorized("cheap apartment", "Rent", "Price", 9000.5),
            categorized("movers", "Moving", "Service", 120.0),
        ];
        let mut out = Vec::new();
        export_categorized(&records, &mut out).unwrap();

        let sheet = parse_sheet_from_reader(out.as_slice()).unwrap();
        assert_eq!(sheet.rows.len(), records.len());

        // Exported headers are exact canonical names, so a bare mapping
        // applies directly.
        let suggestion = crate::resolver::resolve(&sheet.headers, None);
        let mapping = ColumnMapping::from_suggestion(&sheet.headers, &suggestion);
        let reparsed = mapping.apply(&sheet.rows).unwrap();

        let original_cost: f64 = records.iter().filter_map(|c| c.record.cost).sum();
        let reparsed_cost: f64 = reparsed.iter().filter_map(|r| r.cost).sum();
        assert!((original_cost - reparsed_cost).abs() < 1e-6);
    }

    #[test]
    fn test_undefined_metrics_export_blank() {
        let mut r = KeywordRecord::new(KeywordValue::from("quiet"), "exact");
        r.impressions = Some(100.0);
        r.clicks = Some(0.0);
        r.cost = Some(50.0);
        r.conversions = Some(0.0);
        r.metrics = derive_metrics(&r);
        let cr = CategorizedRecord {
            record: r,
            axis_category: "Core".to_string(),
            combination_category: "Intent".to_string(),
        };

        let mut out = Vec::new();
        export_categorized(&[cr], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(1).unwrap();
        // CVR and CPC are undefined: empty cells, not "inf" or "NaN".
        assert!(row.contains(",,"));
        assert!(!text.contains("inf"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_filter_by_category() {
        let records = vec![
            categorized("a", "Rent", "Area", 1.0),
            categorized("b", "Rent", "Price", 1.0),
            categorized("c", "Moving", "Area", 1.0),
        ];
        let rent = filter_by_category(&records, &["Rent".to_string()], &[]);
        assert_eq!(rent.len(), 2);
        let rent_area =
            filter_by_category(&records, &["Rent".to_string()], &["Area".to_string()]);
        assert_eq!(rent_area.len(), 1);
        assert_eq!(rent_area[0].record.keyword.prompt_token(), "a");
        let all = filter_by_category(&records, &[], &[]);
        assert_eq!(all.len(), 3);
    }
}
