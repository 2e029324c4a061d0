//! Math Eval CLI
//!
//! Evaluates model responses to math problems, persists the resulting
//! records, and renders comparative analysis reports.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use math_eval::{
    aggregate, compare_by_problem, dataset, AnalysisReport, EvalSettings, Problem,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "math-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (YAML); defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate model responses against the problem dataset
    Evaluate {
        /// JSON file of model responses keyed by problem id and model
        #[arg(long)]
        responses: PathBuf,

        /// Output file for evaluation records
        #[arg(long, default_value = "results/records.json")]
        output: PathBuf,
    },

    /// Aggregate saved records and render an analysis report
    Analyze {
        /// Records file produced by `evaluate`
        #[arg(long, default_value = "results/records.json")]
        records: PathBuf,

        /// Output report file; extension picks the format
        /// (.json, .md, anything else is plain text)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show per-problem correct/incorrect comparison for saved records
    Compare {
        /// Records file produced by `evaluate`
        #[arg(long, default_value = "results/records.json")]
        records: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => EvalSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => EvalSettings::default(),
    };

    match cli.command {
        Commands::Evaluate { responses, output } => evaluate(&settings, &responses, &output),
        Commands::Analyze { records, output } => analyze(&settings, &records, output.as_deref()),
        Commands::Compare { records } => compare(&records),
    }
}

fn evaluate(settings: &EvalSettings, responses: &Path, output: &Path) -> Result<()> {
    let problems = dataset::load_problems_or_sample(&settings.data_dir);
    let problems = dataset::sample_problems(problems, settings.sample_size);

    let response_set = dataset::load_responses(responses)
        .with_context(|| format!("failed to load responses from {}", responses.display()))?;

    let evaluator = settings.evaluator();
    let mut records = Vec::new();

    for problem in &problems {
        let Some(entries) = response_set.get(&problem.problem_id) else {
            tracing::warn!(problem_id = %problem.problem_id, "no responses for problem");
            continue;
        };
        let responses = dataset::to_model_responses(entries);
        records.extend(evaluator.evaluate_all(problem, &responses));
    }

    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    dataset::save_records(&records, output)
        .with_context(|| format!("failed to save records to {}", output.display()))?;

    let correct = records.iter().filter(|r| r.is_correct).count();
    println!(
        "Evaluated {} responses across {} problems ({} correct)",
        records.len(),
        problems.len(),
        correct
    );
    println!("Records written to {}", output.display());
    Ok(())
}

fn analyze(settings: &EvalSettings, records_path: &Path, output: Option<&Path>) -> Result<()> {
    let records = dataset::load_records(records_path)
        .with_context(|| format!("failed to load records from {}", records_path.display()))?;

    let problems = load_known_problems(settings);
    let metrics = aggregate(&records, &problems);
    let comparisons = compare_by_problem(&records);
    let report = AnalysisReport::new("Model Evaluation Report", metrics, comparisons);

    match output {
        Some(path) => {
            let rendered = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => report.to_json()?,
                Some("md") => report.to_markdown(),
                _ => report.to_text(),
            };
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => print!("{}", report.to_text()),
    }
    Ok(())
}

fn compare(records_path: &Path) -> Result<()> {
    let records = dataset::load_records(records_path)
        .with_context(|| format!("failed to load records from {}", records_path.display()))?;

    for comparison in compare_by_problem(&records) {
        println!("Problem {}", comparison.problem_id);
        if comparison.no_correct_model {
            println!("  no model answered correctly");
        } else {
            println!("  correct:   {}", comparison.correct_models.join(", "));
            if !comparison.incorrect_models.is_empty() {
                println!("  incorrect: {}", comparison.incorrect_models.join(", "));
            }
        }
        for div in &comparison.divergences {
            let at = div
                .divergence_index
                .map_or_else(|| "none".to_string(), |i| format!("step {i}"));
            println!(
                "  {} diverges from {} at {} (missing: {:?}, extra: {:?})",
                div.incorrect_model, div.reference_model, at, div.missing_kinds, div.extra_kinds
            );
        }
        println!();
    }
    Ok(())
}

/// Problems give the analyze step its category labels; records for
/// problems outside the dataset still aggregate, under "unknown".
fn load_known_problems(settings: &EvalSettings) -> Vec<Problem> {
    dataset::load_problems(&settings.data_dir).unwrap_or_default()
}
