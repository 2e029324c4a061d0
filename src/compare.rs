//! Differential reporting: why one model solved a problem and another
//! did not, in terms of their reasoning-step sequences.
//!
//! For each problem the record set is partitioned into correct and
//! incorrect models; every incorrect model's step sequence is paired
//! against a correct model's, reporting the first index where the step
//! kinds diverge and the kind sets present on one side but not the other.

use crate::classify::StepKind;
use crate::evaluate::EvaluationRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Step-level diff between one incorrect model and one correct model on
/// the same problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDivergence {
    /// Model that got the problem wrong
    pub incorrect_model: String,
    /// Correct model used as the reference
    pub reference_model: String,
    /// First index where the step kinds differ; `None` when the sequences
    /// are identical (the divergence is then not structural)
    pub divergence_index: Option<usize>,
    /// Kinds the reference used that the incorrect model never did
    pub missing_kinds: Vec<StepKind>,
    /// Kinds the incorrect model used that the reference never did
    pub extra_kinds: Vec<StepKind>,
    /// Reference model's full kind sequence
    pub reference_sequence: Vec<StepKind>,
    /// Incorrect model's full kind sequence
    pub incorrect_sequence: Vec<StepKind>,
}

/// Comparison of all models' records for one problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemComparison {
    /// Problem under comparison
    pub problem_id: String,
    /// Models that answered correctly, sorted
    pub correct_models: Vec<String>,
    /// Models that answered incorrectly, sorted
    pub incorrect_models: Vec<String>,
    /// One divergence entry per incorrect model, absent when no model was
    /// correct
    pub divergences: Vec<StepDivergence>,
    /// Set when every model failed this problem; the problem is reported,
    /// never silently dropped
    pub no_correct_model: bool,
}

/// Build per-problem comparative reports from a full record set.
///
/// Output order is by problem id; within a problem, divergences follow
/// the sorted incorrect-model order, so the report is deterministic for
/// any input ordering.
#[must_use]
pub fn compare_by_problem(records: &[EvaluationRecord]) -> Vec<ProblemComparison> {
    let mut by_problem: BTreeMap<&str, Vec<&EvaluationRecord>> = BTreeMap::new();
    for record in records {
        by_problem
            .entry(record.problem_id.as_str())
            .or_default()
            .push(record);
    }

    by_problem
        .into_iter()
        .map(|(problem_id, mut records)| {
            records.sort_by(|a, b| a.model_name.cmp(&b.model_name));

            let (correct, incorrect): (Vec<_>, Vec<_>) =
                records.into_iter().partition(|r| r.is_correct);

            let correct_models: Vec<String> =
                correct.iter().map(|r| r.model_name.clone()).collect();
            let incorrect_models: Vec<String> =
                incorrect.iter().map(|r| r.model_name.clone()).collect();

            let divergences = correct.first().map_or_else(Vec::new, |reference| {
                incorrect
                    .iter()
                    .map(|record| diverge(record, reference))
                    .collect()
            });

            ProblemComparison {
                problem_id: problem_id.to_string(),
                no_correct_model: correct_models.is_empty(),
                correct_models,
                incorrect_models,
                divergences,
            }
        })
        .collect()
}

fn diverge(incorrect: &EvaluationRecord, reference: &EvaluationRecord) -> StepDivergence {
    let inc = &incorrect.step_analysis.step_sequence;
    let refr = &reference.step_analysis.step_sequence;

    let divergence_index = first_divergence(inc, refr);

    let inc_kinds: BTreeSet<StepKind> = inc.iter().copied().collect();
    let ref_kinds: BTreeSet<StepKind> = refr.iter().copied().collect();

    StepDivergence {
        incorrect_model: incorrect.model_name.clone(),
        reference_model: reference.model_name.clone(),
        divergence_index,
        missing_kinds: ref_kinds.difference(&inc_kinds).copied().collect(),
        extra_kinds: inc_kinds.difference(&ref_kinds).copied().collect(),
        reference_sequence: refr.clone(),
        incorrect_sequence: inc.clone(),
    }
}

/// First index where two kind sequences differ. When one sequence is a
/// strict prefix of the other, the divergence is at the prefix length;
/// identical sequences have no divergence index.
fn first_divergence(a: &[StepKind], b: &[StepKind]) -> Option<usize> {
    let shared = a.len().min(b.len());
    (0..shared)
        .find(|&i| a[i] != b[i])
        .or_else(|| (a.len() != b.len()).then_some(shared))
}
