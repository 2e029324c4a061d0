//! Order-independent aggregation of evaluation records.
//!
//! The fold is associative and commutative over records: every statistic
//! is a sum, count, min, or max keyed through ordered maps, so the output
//! is identical regardless of input iteration order and the record set can
//! be batched or streamed. Aggregates are derived values, recomputed on
//! demand; the record collection stays the source of truth.

use crate::evaluate::{EvaluationRecord, Problem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Bucket used when an incorrect record carries no error tag.
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Per-model accuracy and step statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Records evaluated for this model
    pub total: usize,
    /// Correct records
    pub correct: usize,
    /// correct / total, 0.0 when total is 0
    pub accuracy: f64,
    /// Mean classified step count per response
    pub avg_steps: f64,
    /// Mean fractional completeness per response
    pub avg_completeness: f64,
}

/// Per-category accuracy, keyed by the problem's declared category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Records for problems in this category
    pub total: usize,
    /// Correct records
    pub correct: usize,
    /// correct / total, 0.0 when total is 0
    pub accuracy: f64,
}

/// Response-time statistics over records that carry timing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    /// Records with timing data
    pub count: usize,
    /// Fastest response
    pub min: Duration,
    /// Slowest response
    pub max: Duration,
    /// Mean response time
    pub average: Duration,
}

/// Aggregate quality metrics over a collection of evaluation records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Records aggregated
    pub total_records: usize,
    /// Correct records across all models and problems
    pub total_correct: usize,
    /// Fraction correct over every record, 0.0 when empty
    pub overall_accuracy: f64,
    /// Accuracy and step statistics per model
    pub per_model: BTreeMap<String, ModelStats>,
    /// Accuracy per declared problem category
    pub category_accuracy: BTreeMap<String, CategoryStats>,
    /// Correct-answer counts keyed by the model's self-reported category,
    /// then by model. Distinct from `category_accuracy`: this one reflects
    /// what the models claimed the problem was, not what it was.
    pub predicted_category_correct: BTreeMap<String, BTreeMap<String, usize>>,
    /// Error-type counts per model over incorrect records
    pub error_distribution: BTreeMap<String, BTreeMap<String, usize>>,
    /// Response-time statistics per model; models with no timed records
    /// are absent
    pub response_times: BTreeMap<String, ResponseTimeStats>,
}

#[derive(Debug, Default)]
struct ModelAccumulator {
    total: usize,
    correct: usize,
    steps: usize,
    completeness: f64,
    time_total: Duration,
    time_count: usize,
    time_min: Option<Duration>,
    time_max: Option<Duration>,
}

/// Fold an arbitrary collection of evaluation records into aggregate
/// metrics. `problems` supplies the declared category per problem id;
/// records for problems without a declared category fall into the
/// "unknown" category bucket.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn aggregate(records: &[EvaluationRecord], problems: &[Problem]) -> AggregateMetrics {
    let categories: BTreeMap<&str, &str> = problems
        .iter()
        .map(|p| {
            (
                p.problem_id.as_str(),
                p.category.as_deref().unwrap_or(UNKNOWN_BUCKET),
            )
        })
        .collect();

    let mut models: BTreeMap<String, ModelAccumulator> = BTreeMap::new();
    let mut category_counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut predicted: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut errors: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut total_correct = 0;

    for record in records {
        let acc = models.entry(record.model_name.clone()).or_default();
        acc.total += 1;
        acc.steps += record.step_analysis.step_count;
        acc.completeness += record.step_analysis.completeness;

        if record.is_correct {
            acc.correct += 1;
            total_correct += 1;

            let self_reported = record
                .predicted_category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(UNKNOWN_BUCKET);
            *predicted
                .entry(self_reported.to_string())
                .or_default()
                .entry(record.model_name.clone())
                .or_insert(0) += 1;
        } else {
            let tag = record.error.as_deref().unwrap_or(UNKNOWN_BUCKET);
            *errors
                .entry(record.model_name.clone())
                .or_default()
                .entry(tag.to_string())
                .or_insert(0) += 1;
        }

        if let Some(time) = record.response_time {
            acc.time_total += time;
            acc.time_count += 1;
            acc.time_min = Some(acc.time_min.map_or(time, |m| m.min(time)));
            acc.time_max = Some(acc.time_max.map_or(time, |m| m.max(time)));
        }

        let category = categories
            .get(record.problem_id.as_str())
            .copied()
            .unwrap_or(UNKNOWN_BUCKET);
        let entry = category_counts.entry(category.to_string()).or_insert((0, 0));
        entry.1 += 1;
        if record.is_correct {
            entry.0 += 1;
        }
    }

    let per_model = models
        .iter()
        .map(|(name, acc)| {
            let total = acc.total.max(1) as f64;
            (
                name.clone(),
                ModelStats {
                    total: acc.total,
                    correct: acc.correct,
                    accuracy: ratio(acc.correct, acc.total),
                    avg_steps: acc.steps as f64 / total,
                    avg_completeness: acc.completeness / total,
                },
            )
        })
        .collect();

    let response_times = models
        .iter()
        .filter(|(_, acc)| acc.time_count > 0)
        .map(|(name, acc)| {
            (
                name.clone(),
                ResponseTimeStats {
                    count: acc.time_count,
                    min: acc.time_min.unwrap_or(Duration::ZERO),
                    max: acc.time_max.unwrap_or(Duration::ZERO),
                    average: acc.time_total / acc.time_count as u32,
                },
            )
        })
        .collect();

    let category_accuracy = category_counts
        .into_iter()
        .map(|(category, (correct, total))| {
            (
                category,
                CategoryStats {
                    total,
                    correct,
                    accuracy: ratio(correct, total),
                },
            )
        })
        .collect();

    AggregateMetrics {
        total_records: records.len(),
        total_correct,
        overall_accuracy: ratio(total_correct, records.len()),
        per_model,
        category_accuracy,
        predicted_category_correct: predicted,
        error_distribution: errors,
        response_times,
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::CorrectnessPolicy;
    use crate::evaluate::{Evaluator, ModelResponse};
    use crate::steps::StepAnalyzer;

    fn problems() -> Vec<Problem> {
        vec![
            Problem {
                problem_id: "p1".to_string(),
                question: "Solve for x: 2x + 5 = 13".to_string(),
                correct_answer: "4".to_string(),
                category: Some("algebra".to_string()),
                difficulty: None,
            },
            Problem {
                problem_id: "p2".to_string(),
                question: "What is 6 * 7?".to_string(),
                correct_answer: "42".to_string(),
                category: Some("arithmetic".to_string()),
                difficulty: None,
            },
        ]
    }

    fn records() -> Vec<EvaluationRecord> {
        let evaluator = Evaluator::new(
            StepAnalyzer::full_solution(),
            CorrectnessPolicy::Membership,
        );
        let problems = problems();

        let mut chatgpt_p1 = ModelResponse::new(
            "chatgpt",
            "Because 2x = 8, we get x = 4.\nAnswer: 4",
        );
        chatgpt_p1.response_time = Some(Duration::from_millis(800));
        chatgpt_p1.predicted_category = Some("algebra".to_string());

        let mut gemini_p1 = ModelResponse::new("gemini", "Therefore x = 3.\nAnswer: 3");
        gemini_p1.response_time = Some(Duration::from_millis(1200));
        gemini_p1.error_type = Some("arithmetic_slip".to_string());

        let chatgpt_p2 = ModelResponse::new("chatgpt", "6 * 7 = 42. Answer: 42");
        let gemini_p2 = ModelResponse::missing("gemini");

        vec![
            evaluator.evaluate(&problems[0], &chatgpt_p1),
            evaluator.evaluate(&problems[0], &gemini_p1),
            evaluator.evaluate(&problems[1], &chatgpt_p2),
            evaluator.evaluate(&problems[1], &gemini_p2),
        ]
    }

    #[test]
    fn test_zero_records() {
        let metrics = aggregate(&[], &[]);

        assert_eq!(metrics.total_records, 0);
        assert!((metrics.overall_accuracy - 0.0).abs() < f64::EPSILON);
        assert!(metrics.per_model.is_empty());
        assert!(metrics.category_accuracy.is_empty());
        assert!(metrics.error_distribution.is_empty());
        assert!(metrics.response_times.is_empty());
    }

    #[test]
    fn test_per_model_accuracy() {
        let metrics = aggregate(&records(), &problems());

        let chatgpt = &metrics.per_model["chatgpt"];
        assert_eq!(chatgpt.total, 2);
        assert_eq!(chatgpt.correct, 2);
        assert!((chatgpt.accuracy - 1.0).abs() < f64::EPSILON);
        assert!(chatgpt.avg_steps > 0.0);

        let gemini = &metrics.per_model["gemini"];
        assert_eq!(gemini.total, 2);
        assert_eq!(gemini.correct, 0);
        assert!((gemini.accuracy - 0.0).abs() < f64::EPSILON);

        assert_eq!(metrics.total_records, 4);
        assert!((metrics.overall_accuracy - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_accuracy_uses_problem_category() {
        let metrics = aggregate(&records(), &problems());

        let algebra = &metrics.category_accuracy["algebra"];
        assert_eq!(algebra.total, 2);
        assert_eq!(algebra.correct, 1);
        assert!((algebra.accuracy - 0.5).abs() < f64::EPSILON);

        let arithmetic = &metrics.category_accuracy["arithmetic"];
        assert_eq!(arithmetic.total, 2);
        assert_eq!(arithmetic.correct, 1);
    }

    #[test]
    fn test_predicted_category_is_separate() {
        let metrics = aggregate(&records(), &problems());

        // Only correct records count; chatgpt self-reported "algebra" for
        // p1 and nothing for p2.
        assert_eq!(metrics.predicted_category_correct["algebra"]["chatgpt"], 1);
        assert_eq!(
            metrics.predicted_category_correct[UNKNOWN_BUCKET]["chatgpt"],
            1
        );
        assert!(!metrics.predicted_category_correct["algebra"].contains_key("gemini"));
    }

    #[test]
    fn test_error_distribution() {
        let metrics = aggregate(&records(), &problems());

        let gemini_errors = &metrics.error_distribution["gemini"];
        assert_eq!(gemini_errors["arithmetic_slip"], 1);
        assert_eq!(gemini_errors[crate::evaluate::NO_RESPONSE_ERROR], 1);
        assert!(!metrics.error_distribution.contains_key("chatgpt"));
    }

    #[test]
    fn test_response_times_exclude_untimed() {
        let metrics = aggregate(&records(), &problems());

        // chatgpt had one timed record out of two; the untimed one is
        // excluded from timing only, not from accuracy.
        let chatgpt = &metrics.response_times["chatgpt"];
        assert_eq!(chatgpt.count, 1);
        assert_eq!(chatgpt.min, Duration::from_millis(800));
        assert_eq!(chatgpt.max, Duration::from_millis(800));
        assert_eq!(chatgpt.average, Duration::from_millis(800));

        let gemini = &metrics.response_times["gemini"];
        assert_eq!(gemini.count, 1);
        assert_eq!(gemini.min, Duration::from_millis(1200));
    }

    #[test]
    fn test_order_invariance() {
        let problems = problems();
        let mut shuffled = records();
        shuffled.reverse();
        shuffled.swap(0, 1);

        assert_eq!(aggregate(&records(), &problems), aggregate(&shuffled, &problems));
    }

    #[test]
    fn test_unknown_category_bucket() {
        let evaluator = Evaluator::default();
        let orphan = Problem {
            problem_id: "p9".to_string(),
            question: "q".to_string(),
            correct_answer: "1".to_string(),
            category: None,
            difficulty: None,
        };
        let record = evaluator.evaluate(&orphan, &ModelResponse::new("chatgpt", "Answer: 1"));

        let metrics = aggregate(&[record], &[orphan]);
        assert!(metrics.category_accuracy.contains_key(UNKNOWN_BUCKET));
    }
}
