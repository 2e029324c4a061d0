//! Step-sequence analysis: counts, ordered kind sequence, completeness.
//!
//! Completeness is scored fractionally: the fraction of expected step
//! kinds that appear at least once anywhere in the sequence, in [0, 1].
//! Order is not enforced. The empty sequence always scores 0.0.

use crate::classify::{Step, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Analysis of one response's classified step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnalysis {
    /// Total number of classified steps
    pub step_count: usize,
    /// Occurrence count per step kind
    pub step_types: BTreeMap<StepKind, usize>,
    /// Step kinds in order of appearance
    pub step_sequence: Vec<StepKind>,
    /// Fraction of expected kinds present, in [0, 1]
    pub completeness: f64,
}

impl StepAnalysis {
    /// Analysis of an empty response (zero steps, completeness 0.0).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            step_count: 0,
            step_types: BTreeMap::new(),
            step_sequence: Vec::new(),
            completeness: 0.0,
        }
    }

    /// Whether every expected step kind was present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completeness >= 1.0
    }
}

/// Analyzer configured with the deployment's expected step-kind set.
#[derive(Debug, Clone)]
pub struct StepAnalyzer {
    expected: BTreeSet<StepKind>,
}

impl StepAnalyzer {
    /// Build an analyzer with an explicit expected step-kind set.
    #[must_use]
    pub fn new<I: IntoIterator<Item = StepKind>>(expected: I) -> Self {
        Self {
            expected: expected.into_iter().collect(),
        }
    }

    /// The canonical expected set for full worked solutions.
    #[must_use]
    pub fn full_solution() -> Self {
        Self::new([
            StepKind::Explanation,
            StepKind::Substitution,
            StepKind::Calculation,
            StepKind::Simplification,
            StepKind::Verification,
            StepKind::Conclusion,
        ])
    }

    /// Expected step kinds, sorted.
    #[must_use]
    pub fn expected(&self) -> &BTreeSet<StepKind> {
        &self.expected
    }

    /// Turn a classified step list into counts, an ordered kind sequence,
    /// and a fractional completeness score.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn analyze(&self, steps: &[Step]) -> StepAnalysis {
        if steps.is_empty() {
            return StepAnalysis::empty();
        }

        let mut step_types: BTreeMap<StepKind, usize> = BTreeMap::new();
        let mut step_sequence = Vec::with_capacity(steps.len());

        for step in steps {
            *step_types.entry(step.kind).or_insert(0) += 1;
            step_sequence.push(step.kind);
        }

        let completeness = if self.expected.is_empty() {
            0.0
        } else {
            let present = self
                .expected
                .iter()
                .filter(|kind| step_types.contains_key(kind))
                .count();
            present as f64 / self.expected.len() as f64
        };

        StepAnalysis {
            step_count: steps.len(),
            step_types,
            step_sequence,
            completeness,
        }
    }
}

impl Default for StepAnalyzer {
    fn default() -> Self {
        Self::full_solution()
    }
}
