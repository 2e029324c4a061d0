//! # Math Eval
//!
//! Evaluation pipeline for AI-generated solutions to mathematical problems.
//!
//! Responses from multiple answer-generating models are scored for
//! correctness against ground-truth answers, and the reasoning inside
//! each response is decomposed into typed solution steps so that model
//! failures can be located structurally, not just counted.
//!
//! ## Architecture
//!
//! ```text
//! Problems (CSV) + Model Responses (JSON)
//!        ↓
//! Step Classification (ordered regex rules)
//!        ↓
//! Answer Extraction + Normalization
//!        ↓
//! Evaluation Records (one per problem × model)
//!        ↓
//! Aggregation (accuracy, steps, completeness, errors, timing)
//!        ↓
//! Comparative Analysis (step-sequence divergence)
//!        ↓
//! Report (JSON | markdown | text)
//! ```
//!
//! The record collection is the source of truth; every aggregate and
//! comparison is recomputed from it and is invariant under record order.

pub mod aggregate;
pub mod answer;
pub mod classify;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod evaluate;
pub mod report;
pub mod steps;

pub use aggregate::{
    aggregate, AggregateMetrics, CategoryStats, ModelStats, ResponseTimeStats, UNKNOWN_BUCKET,
};
pub use answer::{
    check_correctness, extract_answer, normalize_answer, CorrectnessPolicy, PolicyParseError,
};
pub use classify::{Step, StepClassifier, StepKind};
pub use compare::{compare_by_problem, ProblemComparison, StepDivergence};
pub use config::{ConfigError, EvalSettings};
pub use dataset::{
    load_problems, load_problems_or_sample, load_records, load_responses, sample_problems,
    save_records, to_model_responses, DatasetError, RawResponse, RecordTree, ResponseSet,
};
pub use evaluate::{
    EvaluationRecord, Evaluator, ModelResponse, Problem, NO_RESPONSE_ERROR,
};
pub use report::{AnalysisReport, ReportMetadata};
pub use steps::{StepAnalysis, StepAnalyzer};
