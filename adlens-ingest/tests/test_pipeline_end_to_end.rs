//! End-to-end pipeline test: messy sheet in, rollup tables out, with a
//! scripted oracle covering the degraded paths.

use adlens_classify::{classify_keywords, BatchOutcome, ClassifyOptions, Oracle};
use adlens_core::{AnalysisState, UNCATEGORIZED, UNCLASSIFIED_GROUP};
use adlens_ingest::{export_categorized, parse_sheet_from_reader, resolve, ColumnMapping};
use anyhow::{bail, Result};
use std::time::Duration;

const SHEET: &str = "\
検索語句,一致タイプ,インプレッション数,クリック数,消化金額,CV数,キャンペーン名
渋谷 賃貸,完全一致,\"1,200\",120,\"¥24,000\",5,ブランド
渋谷 賃貸 安い,部分一致,900,45,\"¥9,000\",1,ブランド
引越し 業者,フレーズ一致,600,30,\"¥3,000\",2,その他
メモ帳,完全一致,100,1,\"¥100\",0,その他
";

struct ScriptedOracle {
    responses: std::cell::RefCell<Vec<Result<String>>>,
}

impl ScriptedOracle {
    fn new(mut responses: Vec<Result<String>>) -> Self {
        responses.reverse();
        Self {
            responses: std::cell::RefCell::new(responses),
        }
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        match self.responses.borrow_mut().pop() {
            Some(r) => r,
            None => bail!("oracle exhausted"),
        }
    }
}

fn options() -> ClassifyOptions {
    ClassifyOptions {
        service_description: "Apartment rental listings in Tokyo".to_string(),
        batch_size: 100,
        inter_batch_delay: Duration::ZERO,
    }
}

fn canonicalize() -> AnalysisState {
    let sheet = parse_sheet_from_reader(SHEET.as_bytes()).unwrap();
    let suggestion = resolve(&sheet.headers, None);
    let mapping = ColumnMapping::from_suggestion(&sheet.headers, &suggestion);
    AnalysisState::from_records(mapping.apply(&sheet.rows).unwrap())
}

#[test]
fn test_rule_based_resolution_of_japanese_headers() {
    let state = canonicalize();
    assert_eq!(state.records.len(), 4);

    let first = &state.records[0];
    assert_eq!(first.keyword.prompt_token(), "渋谷 賃貸");
    assert_eq!(first.impressions, Some(1200.0));
    assert_eq!(first.cost, Some(24000.0));
    assert_eq!(first.campaign_name.as_deref(), Some("ブランド"));
    assert_eq!(first.metrics.ctr, Some(10.0));
    assert_eq!(first.metrics.cpa, Some(4800.0));

    let (rows, cost, clicks, conversions) = state.totals();
    assert_eq!(rows, 4);
    assert_eq!(cost, 36100.0);
    assert_eq!(clicks, 196.0);
    assert_eq!(conversions, 8.0);
}

#[test]
fn test_selection_bounds_classification_to_top_spenders() {
    // Total cost 36,100: the 24,000 row is 66.5%, adding 9,000 reaches
    // 91.4%, so an 80% threshold selects only the top keyword.
    let state = canonicalize().with_selection(80.0);
    let tokens: Vec<String> = state.selection.iter().map(|k| k.prompt_token()).collect();
    assert_eq!(tokens, vec!["渋谷 賃貸"]);

    let state = canonicalize().with_selection(100.0);
    assert_eq!(state.selection.len(), 4);
}

#[test]
fn test_happy_path_to_rollups_and_export() {
    let state = canonicalize().with_selection(100.0);

    let oracle = ScriptedOracle::new(vec![Ok(r#"Here are the results:
```json
[
  {"keyword": "渋谷 賃貸", "axis_category": "賃貸", "combination_category": "エリア"},
  {"keyword": "渋谷 賃貸 安い", "axis_category": "賃貸", "combination_category": "価格"},
  {"keyword": "引越し 業者", "axis_category": "引越し", "combination_category": "サービス"}
]
```"#
        .to_string())]);

    let run = classify_keywords(&oracle, &state.selection, &options());
    assert_eq!(run.diagnostics[0].outcome, BatchOutcome::Classified);

    let state = state.with_assignments(run.assignments).with_rollups();
    let stats = state.stats.as_ref().unwrap();

    // The unreturned keyword falls into the join-time default bucket.
    assert!(stats.axis.contains_key(UNCATEGORIZED));
    assert_eq!(stats.axis["賃貸"].keyword_count, 2);
    assert_eq!(stats.axis["賃貸"].cost, 33000.0);

    // Mass conservation across the axis rollup.
    let rolled: f64 = stats.axis.values().map(|g| g.cost).sum();
    assert_eq!(rolled, 36100.0);

    // Sum-then-divide: 165 clicks / 2100 impressions = 7.86%.
    assert_eq!(stats.axis["賃貸"].ctr, Some(7.86));

    // Export re-parses with identical row count and cost.
    let mut out = Vec::new();
    export_categorized(&state.categorized, &mut out).unwrap();
    let reparsed = parse_sheet_from_reader(out.as_slice()).unwrap();
    assert_eq!(reparsed.rows.len(), state.categorized.len());
}

#[test]
fn test_oracle_outage_degrades_to_sentinel_buckets() {
    let state = canonicalize().with_selection(100.0);
    let oracle = ScriptedOracle::new(vec![]);

    let run = classify_keywords(&oracle, &state.selection, &options());
    assert_eq!(run.assignments.len(), state.selection.len());
    assert_eq!(run.diagnostics[0].outcome, BatchOutcome::SentinelFallback);

    let state = state.with_assignments(run.assignments).with_rollups();
    let stats = state.stats.as_ref().unwrap();
    assert_eq!(stats.axis[UNCLASSIFIED_GROUP].keyword_count, 4);
    let rolled: f64 = stats.axis.values().map(|g| g.cost).sum();
    assert_eq!(rolled, 36100.0);
}
