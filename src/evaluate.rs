//! Evaluation record construction: one immutable record per
//! (problem, model response) pair.
//!
//! A missing response is a valid input, not an error: it produces an
//! incorrect, zero-step record carrying an explicit marker, so every
//! (problem, model) pair always yields exactly one record.

use crate::answer::{check_correctness, extract_answer, CorrectnessPolicy};
use crate::classify::StepClassifier;
use crate::steps::{StepAnalysis, StepAnalyzer};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Marker stored on records for provider failures.
pub const NO_RESPONSE_ERROR: &str = "no response received from model";

/// One mathematical problem with its ground-truth answer.
///
/// Immutable once loaded; evaluation never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Unique problem identifier
    pub problem_id: String,
    /// Problem statement
    pub question: String,
    /// Canonical ground-truth answer, arbitrary notation
    pub correct_answer: String,
    /// Declared category (e.g. "geometry")
    #[serde(default)]
    pub category: Option<String>,
    /// Declared difficulty
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl Problem {
    /// Built-in sample problem used when no dataset is available.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            problem_id: "sample_1".to_string(),
            question: "What is the area of a circle with radius 5?".to_string(),
            correct_answer: "25π".to_string(),
            category: Some("geometry".to_string()),
            difficulty: Some("medium".to_string()),
        }
    }
}

/// Raw response from one answer-generating service for one problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Name of the responding model
    pub model_name: String,
    /// Response text; `None` means the provider failed to answer
    pub raw_text: Option<String>,
    /// Category the model self-reported for the problem
    #[serde(default)]
    pub predicted_category: Option<String>,
    /// Wall-clock time the provider took, when the collaborator measured it
    #[serde(default)]
    pub response_time: Option<Duration>,
    /// Error-type tag supplied by the collaborator for failed answers
    #[serde(default)]
    pub error_type: Option<String>,
}

impl ModelResponse {
    /// Response with text only, no timing or tags.
    #[must_use]
    pub fn new(model_name: &str, raw_text: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            raw_text: Some(raw_text.to_string()),
            predicted_category: None,
            response_time: None,
            error_type: None,
        }
    }

    /// Marker for a provider that produced no answer.
    #[must_use]
    pub fn missing(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            raw_text: None,
            predicted_category: None,
            response_time: None,
            error_type: None,
        }
    }
}

/// The atomic, immutable result of evaluating one model's response to one
/// problem. Created once per evaluation run, never mutated afterward.
///
/// `is_correct` is a deterministic function of `raw_text` and the
/// problem's `correct_answer` under the configured policy; no external
/// state or ordering influences it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Problem this record evaluates
    pub problem_id: String,
    /// Model that produced the response
    pub model_name: String,
    /// The evaluated response text, absent for provider failures
    pub raw_text: Option<String>,
    /// Model's self-reported category
    pub predicted_category: Option<String>,
    /// Correctness under the run's policy
    pub is_correct: bool,
    /// Extracted final answer, if any number was found
    pub extracted_answer: Option<String>,
    /// Structural analysis of the reasoning steps
    pub step_analysis: StepAnalysis,
    /// Provider latency, when supplied
    pub response_time: Option<Duration>,
    /// Collaborator-supplied error tag; set to [`NO_RESPONSE_ERROR`] for
    /// missing responses
    pub error: Option<String>,
}

/// Builder composing classifier, analyzer, and correctness policy into
/// per-pair evaluation records.
///
/// Pure and synchronous: evaluation of distinct pairs is order-independent
/// and safe to parallelize over problems and models.
#[derive(Debug)]
pub struct Evaluator {
    classifier: StepClassifier,
    analyzer: StepAnalyzer,
    policy: CorrectnessPolicy,
}

impl Evaluator {
    /// Build an evaluator with an explicit analyzer and policy.
    #[must_use]
    pub fn new(analyzer: StepAnalyzer, policy: CorrectnessPolicy) -> Self {
        Self {
            classifier: StepClassifier::new(),
            analyzer,
            policy,
        }
    }

    /// The correctness policy this evaluator applies.
    #[must_use]
    pub const fn policy(&self) -> CorrectnessPolicy {
        self.policy
    }

    /// Evaluate one model response against one problem.
    pub fn evaluate(&self, problem: &Problem, response: &ModelResponse) -> EvaluationRecord {
        let Some(text) = response.raw_text.as_deref() else {
            tracing::debug!(
                problem_id = %problem.problem_id,
                model = %response.model_name,
                "no response from provider"
            );
            return EvaluationRecord {
                problem_id: problem.problem_id.clone(),
                model_name: response.model_name.clone(),
                raw_text: None,
                predicted_category: response.predicted_category.clone(),
                is_correct: false,
                extracted_answer: None,
                step_analysis: StepAnalysis::empty(),
                response_time: response.response_time,
                error: Some(NO_RESPONSE_ERROR.to_string()),
            };
        };

        let steps = self.classifier.extract_steps(text);
        let step_analysis = self.analyzer.analyze(&steps);
        let extracted_answer = extract_answer(text);
        let is_correct = check_correctness(text, &problem.correct_answer, self.policy);

        EvaluationRecord {
            problem_id: problem.problem_id.clone(),
            model_name: response.model_name.clone(),
            raw_text: Some(text.to_string()),
            predicted_category: response.predicted_category.clone(),
            is_correct,
            extracted_answer,
            step_analysis,
            response_time: response.response_time,
            error: if is_correct {
                None
            } else {
                response.error_type.clone()
            },
        }
    }

    /// Evaluate every response to a problem, one record per model.
    pub fn evaluate_all(
        &self,
        problem: &Problem,
        responses: &[ModelResponse],
    ) -> Vec<EvaluationRecord> {
        responses
            .iter()
            .map(|response| self.evaluate(problem, response))
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(StepAnalyzer::full_solution(), CorrectnessPolicy::Membership)
    }
}
