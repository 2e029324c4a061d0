//! Report generation for evaluation runs.
//!
//! Wraps the aggregate metrics and the per-problem comparisons into a
//! single report with metadata, rendered as JSON, markdown, or plain
//! text tables.

use crate::aggregate::AggregateMetrics;
use crate::compare::ProblemComparison;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::{Table, Tabled};

/// Full analysis report for one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Aggregate quality metrics
    pub metrics: AggregateMetrics,
    /// Per-problem comparative analysis
    pub comparisons: Vec<ProblemComparison>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title
    pub title: String,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Framework version
    pub framework_version: String,
}

impl AnalysisReport {
    /// Assemble a report from computed metrics and comparisons.
    #[must_use]
    pub fn new(
        title: &str,
        metrics: AggregateMetrics,
        comparisons: Vec<ProblemComparison>,
    ) -> Self {
        Self {
            metadata: ReportMetadata {
                title: title.to_string(),
                generated_at: Utc::now(),
                framework_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            metrics,
            comparisons,
        }
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as markdown
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(
            output,
            "**Framework Version:** {}",
            self.metadata.framework_version
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "## Summary").ok();
        writeln!(output).ok();
        writeln!(output, "| Metric | Value |").ok();
        writeln!(output, "|--------|-------|").ok();
        writeln!(output, "| Total Records | {} |", self.metrics.total_records).ok();
        writeln!(output, "| Total Correct | {} |", self.metrics.total_correct).ok();
        writeln!(
            output,
            "| Overall Accuracy | {:.2}% |",
            self.metrics.overall_accuracy * 100.0
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "## Model Results").ok();
        writeln!(output).ok();
        let table = Table::new(self.model_rows()).to_string();
        writeln!(output, "{table}").ok();
        writeln!(output).ok();

        if !self.metrics.category_accuracy.is_empty() {
            writeln!(output, "## Accuracy by Problem Category").ok();
            writeln!(output).ok();
            writeln!(output, "| Category | Correct | Total | Accuracy |").ok();
            writeln!(output, "|----------|---------|-------|----------|").ok();
            for (category, stats) in &self.metrics.category_accuracy {
                writeln!(
                    output,
                    "| {} | {} | {} | {:.2}% |",
                    category,
                    stats.correct,
                    stats.total,
                    stats.accuracy * 100.0
                )
                .ok();
            }
            writeln!(output).ok();
        }

        if !self.metrics.error_distribution.is_empty() {
            writeln!(output, "## Error Distribution").ok();
            writeln!(output).ok();
            for (model, errors) in &self.metrics.error_distribution {
                writeln!(output, "**{model}**").ok();
                writeln!(output).ok();
                for (error_type, count) in errors {
                    writeln!(output, "- {error_type}: {count}").ok();
                }
                writeln!(output).ok();
            }
        }

        if !self.comparisons.is_empty() {
            writeln!(output, "## Problem Comparisons").ok();
            writeln!(output).ok();
            for comparison in &self.comparisons {
                writeln!(output, "### {}", comparison.problem_id).ok();
                writeln!(output).ok();
                if comparison.no_correct_model {
                    writeln!(output, "No model solved this problem.").ok();
                } else {
                    writeln!(
                        output,
                        "**Correct:** {}",
                        comparison.correct_models.join(", ")
                    )
                    .ok();
                    if !comparison.incorrect_models.is_empty() {
                        writeln!(
                            output,
                            "**Incorrect:** {}",
                            comparison.incorrect_models.join(", ")
                        )
                        .ok();
                    }
                }
                writeln!(output).ok();
                for div in &comparison.divergences {
                    let at = div
                        .divergence_index
                        .map_or_else(|| "none".to_string(), |i| format!("step {i}"));
                    writeln!(
                        output,
                        "- {} vs {}: divergence at {}, missing {:?}, extra {:?}",
                        div.incorrect_model,
                        div.reference_model,
                        at,
                        div.missing_kinds,
                        div.extra_kinds
                    )
                    .ok();
                }
                if !comparison.divergences.is_empty() {
                    writeln!(output).ok();
                }
            }
        }

        output
    }

    /// Render report as plain text table
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();
        writeln!(output, "  {}", self.metadata.title).ok();
        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "SUMMARY").ok();
        writeln!(
            output,
            "───────────────────────────────────────────────────────────────"
        )
        .ok();
        writeln!(output, "  Total Records:    {}", self.metrics.total_records).ok();
        writeln!(output, "  Total Correct:    {}", self.metrics.total_correct).ok();
        writeln!(
            output,
            "  Overall Accuracy: {:.2}%",
            self.metrics.overall_accuracy * 100.0
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "MODEL RESULTS").ok();
        writeln!(
            output,
            "───────────────────────────────────────────────────────────────"
        )
        .ok();
        let table = Table::new(self.model_rows()).to_string();
        writeln!(output, "{table}").ok();

        if self.comparisons.iter().any(|c| c.no_correct_model) {
            writeln!(output).ok();
            writeln!(output, "UNSOLVED PROBLEMS").ok();
            writeln!(
                output,
                "───────────────────────────────────────────────────────────────"
            )
            .ok();
            for comparison in &self.comparisons {
                if comparison.no_correct_model {
                    writeln!(output, "  {}", comparison.problem_id).ok();
                }
            }
        }

        output
    }

    fn model_rows(&self) -> Vec<ResultTableRow> {
        self.metrics
            .per_model
            .iter()
            .map(|(name, stats)| {
                let timing = self.metrics.response_times.get(name).map_or_else(
                    || "-".to_string(),
                    |t| format!("{}ms", t.average.as_millis()),
                );
                ResultTableRow {
                    model: name.clone(),
                    accuracy: format!("{:.2}%", stats.accuracy * 100.0),
                    correct: format!("{}/{}", stats.correct, stats.total),
                    avg_steps: format!("{:.1}", stats.avg_steps),
                    completeness: format!("{:.2}", stats.avg_completeness),
                    avg_time: timing,
                }
            })
            .collect()
    }
}

/// Table row for text/markdown output
#[derive(Tabled)]
struct ResultTableRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Correct")]
    correct: String,
    #[tabled(rename = "Avg Steps")]
    avg_steps: String,
    #[tabled(rename = "Completeness")]
    completeness: String,
    #[tabled(rename = "Avg Time")]
    avg_time: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::compare::compare_by_problem;
    use crate::evaluate::{Evaluator, ModelResponse, Problem};

    fn build_report() -> AnalysisReport {
        let problem = Problem {
            problem_id: "p1".to_string(),
            question: "Solve for x: 2x + 5 = 13".to_string(),
            correct_answer: "4".to_string(),
            category: Some("algebra".to_string()),
            difficulty: None,
        };

        let evaluator = Evaluator::default();
        let records = evaluator.evaluate_all(
            &problem,
            &[
                ModelResponse::new("chatgpt", "Because 2x = 8, x = 4.\nAnswer: 4"),
                ModelResponse::new("gemini", "Therefore x = 3.\nAnswer: 3"),
            ],
        );

        AnalysisReport::new(
            "Model Evaluation Report",
            aggregate(&records, std::slice::from_ref(&problem)),
            compare_by_problem(&records),
        )
    }

    #[test]
    fn test_metadata() {
        let report = build_report();
        assert_eq!(report.metadata.title, "Model Evaluation Report");
        assert_eq!(report.metadata.framework_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_to_json() {
        let report = build_report();
        let json = report.to_json().unwrap();
        assert!(json.contains("chatgpt"));
        assert!(json.contains("overall_accuracy"));
    }

    #[test]
    fn test_to_markdown() {
        let report = build_report();
        let markdown = report.to_markdown();

        assert!(markdown.contains("# Model Evaluation Report"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Model Results"));
        assert!(markdown.contains("## Accuracy by Problem Category"));
        assert!(markdown.contains("chatgpt"));
        assert!(markdown.contains("gemini"));
    }

    #[test]
    fn test_to_text() {
        let report = build_report();
        let text = report.to_text();

        assert!(text.contains("SUMMARY"));
        assert!(text.contains("MODEL RESULTS"));
        assert!(text.contains("chatgpt"));
    }

    #[test]
    fn test_markdown_reports_unsolved_problems() {
        let problem = Problem {
            problem_id: "p2".to_string(),
            question: "What is 6 * 7?".to_string(),
            correct_answer: "42".to_string(),
            category: None,
            difficulty: None,
        };

        let evaluator = Evaluator::default();
        let records = evaluator.evaluate_all(
            &problem,
            &[
                ModelResponse::new("chatgpt", "Answer: 41"),
                ModelResponse::missing("gemini"),
            ],
        );

        let report = AnalysisReport::new(
            "Report",
            aggregate(&records, std::slice::from_ref(&problem)),
            compare_by_problem(&records),
        );

        assert!(report.to_markdown().contains("No model solved this problem."));
        assert!(report.to_text().contains("UNSOLVED PROBLEMS"));
    }
}
