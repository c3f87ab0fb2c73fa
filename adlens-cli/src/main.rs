use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use adlens_classify::{
    classify_keywords, generate_report, BatchOutcome, ClassifyOptions, OpenAiOracle, Oracle,
};
use adlens_core::{AnalysisState, CategoryStats, GroupTotals};
use adlens_ingest::{
    export_categorized_to_path, filter_by_category, parse_sheet, resolve, ColumnMapping, Sheet,
    SuggestedMapping,
};

mod config;

#[derive(Parser, Debug)]
#[command(name = "adlens", version, about = "Keyword performance analysis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config to ~/.adlens/config.toml
    InitConfig,

    /// Show the suggested column mapping for a sheet without running anything
    Map {
        /// Path to the keyword sheet (CSV, first row = headers)
        input: PathBuf,

        /// Skip the oracle suggestion and use rules only
        #[arg(long)]
        no_oracle: bool,
    },

    /// Run the full pipeline: map, derive, select, classify, aggregate, export
    Analyze {
        /// Path to the keyword sheet (CSV, first row = headers)
        input: PathBuf,

        /// Where to write the categorized dataset (default: categorized_keywords.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip all oracle calls; every keyword lands in the default bucket
        #[arg(long)]
        no_oracle: bool,

        /// Apply the suggested mapping without asking
        #[arg(long)]
        accept: bool,

        /// Keep only these axis categories in the export (repeatable)
        #[arg(long)]
        axis: Vec<String>,

        /// Keep only these combination categories in the export (repeatable)
        #[arg(long)]
        combination: Vec<String>,
    },

    /// Run the pipeline and generate a narrative analysis report
    Report {
        /// Path to the keyword sheet (CSV, first row = headers)
        input: PathBuf,

        /// Apply the suggested mapping without asking
        #[arg(long)]
        accept: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig => config::init_config(),
        Command::Map { input, no_oracle } => run_map(&input, no_oracle),
        Command::Analyze {
            input,
            output,
            no_oracle,
            accept,
            axis,
            combination,
        } => run_analyze(&input, output, no_oracle, accept, &axis, &combination),
        Command::Report { input, accept } => run_report(&input, accept),
    }
}

/// Build the oracle when a credential is configured; None otherwise.
fn maybe_oracle(cfg: &config::Config) -> Option<OpenAiOracle> {
    OpenAiOracle::new(cfg.oracle_config().ok()?).ok()
}

/// Oracle-dependent operations refuse to start without a credential.
fn require_oracle(cfg: &config::Config) -> Result<OpenAiOracle> {
    OpenAiOracle::new(cfg.oracle_config()?)
}

fn print_suggestion(sheet: &Sheet, suggestion: &SuggestedMapping) {
    println!("Suggested column mapping:");
    for label in &sheet.headers {
        let resolved = suggestion
            .by_label
            .get(label)
            .copied()
            .flatten()
            .map(|f| f.name())
            .unwrap_or("(unknown)");
        println!("  {label} -> {resolved}");
    }
    if let Some(err) = &suggestion.diagnostics.oracle_error {
        println!("note: oracle suggestion unavailable, used rules only ({err})");
    }
    if !suggestion.diagnostics.missing_required.is_empty() {
        let names: Vec<&str> = suggestion
            .diagnostics
            .missing_required
            .iter()
            .map(|f| f.name())
            .collect();
        println!("warning: no column found for required fields: {}", names.join(", "));
    }
}

fn run_map(input: &PathBuf, no_oracle: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let sheet = parse_sheet(input)?;
    println!("Detected {} columns, {} rows", sheet.headers.len(), sheet.rows.len());

    let oracle = if no_oracle { None } else { maybe_oracle(&cfg) };
    let suggestion = resolve(
        &sheet.headers,
        oracle.as_ref().map(|o| o as &dyn Oracle),
    );
    print_suggestion(&sheet, &suggestion);
    Ok(())
}

/// Mapping confirmation: the suggestion is never applied silently.
fn confirm_mapping(sheet: &Sheet, suggestion: &SuggestedMapping, accept: bool) -> Result<ColumnMapping> {
    print_suggestion(sheet, suggestion);
    let mapping = ColumnMapping::from_suggestion(&sheet.headers, suggestion);

    let missing = mapping.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
        bail!(
            "cannot proceed: required fields not mapped: {} \
             (rename the columns or rerun with the oracle enabled)",
            names.join(", ")
        );
    }

    if !accept {
        print!("Apply this mapping? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            bail!("mapping not applied (rerun with --accept to apply without asking)");
        }
    }

    Ok(mapping)
}

fn run_pipeline(
    cfg: &config::Config,
    input: &PathBuf,
    accept: bool,
    oracle: Option<&dyn Oracle>,
) -> Result<AnalysisState> {
    let sheet = parse_sheet(input).with_context(|| format!("reading {}", input.display()))?;
    println!("Detected {} columns, {} rows", sheet.headers.len(), sheet.rows.len());

    let suggestion = resolve(&sheet.headers, oracle);
    let mapping = confirm_mapping(&sheet, &suggestion, accept)?;

    let state = AnalysisState::from_records(mapping.apply(&sheet.rows)?);
    let (rows, cost, clicks, conversions) = state.totals();
    println!(
        "Loaded {rows} rows | cost {cost:.0} | clicks {clicks:.0} | conversions {conversions:.0}"
    );

    let state = state.with_selection(cfg.analysis.cost_threshold_percent);
    println!(
        "Selected {} unique keywords covering the top {:.0}% of spend",
        state.selection.len(),
        cfg.analysis.cost_threshold_percent
    );

    let assignments = match oracle {
        Some(oracle) => {
            let options = ClassifyOptions {
                service_description: cfg.analysis.service_description.clone(),
                batch_size: cfg.analysis.max_keywords_per_batch,
                inter_batch_delay: Duration::from_millis(500),
            };
            let run = classify_keywords(oracle, &state.selection, &options);
            for d in &run.diagnostics {
                let outcome = match d.outcome {
                    BatchOutcome::Classified => "ok",
                    BatchOutcome::RecoveredViaClustering => "recovered via clustering",
                    BatchOutcome::SentinelFallback => "sentinel fallback",
                    BatchOutcome::EmptyInput => "nothing to classify",
                };
                match &d.detail {
                    Some(detail) => eprintln!(
                        "batch {}: {} keywords, {outcome} ({detail})",
                        d.batch_index + 1,
                        d.keyword_count
                    ),
                    None => println!(
                        "batch {}: {} keywords, {outcome}",
                        d.batch_index + 1,
                        d.keyword_count
                    ),
                }
            }
            run.assignments
        }
        None => {
            println!("Oracle disabled: keywords will land in the default bucket");
            Vec::new()
        }
    };

    Ok(state.with_assignments(assignments).with_rollups())
}

fn run_analyze(
    input: &PathBuf,
    output: Option<PathBuf>,
    no_oracle: bool,
    accept: bool,
    axis: &[String],
    combination: &[String],
) -> Result<()> {
    let cfg = config::load_config()?;
    let oracle = if no_oracle { None } else { Some(require_oracle(&cfg)?) };
    let state = run_pipeline(&cfg, input, accept, oracle.as_ref().map(|o| o as &dyn Oracle))?;

    let stats = state.stats.as_ref().expect("rollups built");
    println!("\nAxis category performance:");
    for (name, g) in &stats.axis {
        println!(
            "  {name}: keywords={} cost={:.0} conversions={:.0} cpa={}",
            g.keyword_count,
            g.cost,
            g.conversions,
            g.cpa.map(|v| format!("{v:.0}")).unwrap_or_else(|| "-".to_string()),
        );
    }
    println!(
        "{} axis categories, {} combination categories",
        stats.axis.len(),
        stats.combination.len()
    );

    print_quick_insights(stats, &state, &cfg);

    let exported = filter_by_category(&state.categorized, axis, combination);
    let path = output.unwrap_or_else(|| PathBuf::from("categorized_keywords.csv"));
    export_categorized_to_path(&exported, &path)?;
    println!("Wrote {} rows to {}", exported.len(), path.display());
    Ok(())
}

/// Efficiency shortlists gated by the configured thresholds, mirroring the
/// sidebar settings of the original dashboard.
fn print_quick_insights(stats: &CategoryStats, state: &AnalysisState, cfg: &config::Config) {
    let ranked = |ascending: bool| -> Vec<(&String, &GroupTotals)> {
        let mut rows: Vec<_> = stats
            .axis
            .iter()
            .filter(|(_, g)| g.conversions > 0.0 && g.keyword_count >= 3 && g.cpa.is_some())
            .filter(|(_, g)| ascending || g.cost > cfg.analysis.min_cost_threshold)
            .collect();
        rows.sort_by(|a, b| {
            let (x, y) = (a.1.cpa.unwrap_or(f64::MAX), b.1.cpa.unwrap_or(f64::MAX));
            if ascending { x.total_cmp(&y) } else { y.total_cmp(&x) }
        });
        rows.truncate(5);
        rows
    };

    let best = ranked(true);
    if !best.is_empty() {
        println!("\nMost efficient axis categories (by CPA):");
        for (name, g) in best {
            println!("  {name}: cpa={:.0} cvr={:.2}", g.cpa.unwrap_or(0.0), g.cvr.unwrap_or(0.0));
        }
    }
    let worst = ranked(false);
    if !worst.is_empty() {
        println!("Axis categories with room to improve (by CPA, cost > {:.0}):", cfg.analysis.min_cost_threshold);
        for (name, g) in worst {
            println!("  {name}: cpa={:.0} cost={:.0}", g.cpa.unwrap_or(0.0), g.cost);
        }
    }

    let active = state
        .categorized
        .iter()
        .filter(|c| c.record.clicks.unwrap_or(0.0) > cfg.analysis.min_clicks)
        .count();
    println!(
        "{active} keywords above the {:.0}-click floor",
        cfg.analysis.min_clicks
    );
}

fn run_report(input: &PathBuf, accept: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let oracle = require_oracle(&cfg)?;
    let state = run_pipeline(&cfg, input, accept, Some(&oracle as &dyn Oracle))?;

    let stats = state.stats.as_ref().expect("rollups built");
    let report = generate_report(&oracle, stats, &cfg.analysis.service_description)?;
    println!("\n{report}");
    Ok(())
}
