//! Evaluation settings loaded from YAML.
//!
//! Every policy knob the pipeline has lives here as an explicit value:
//! the correctness policy and the expected step-kind set are configuration
//! passed into constructors, never process-wide state.

use crate::answer::CorrectnessPolicy;
use crate::classify::StepKind;
use crate::evaluate::Evaluator;
use crate::steps::StepAnalyzer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected step set must not be empty")]
    EmptyExpectedSteps,
}

/// Settings for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalSettings {
    /// Correctness decision rule, fixed for the whole run
    #[serde(default = "default_policy")]
    pub correctness_policy: CorrectnessPolicy,
    /// Step kinds a complete solution is expected to contain
    #[serde(default = "default_expected_steps")]
    pub expected_steps: Vec<StepKind>,
    /// Directory holding problem CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory evaluation artifacts are written to
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    /// Number of problems sampled per run; 0 means all
    #[serde(default)]
    pub sample_size: usize,
}

fn default_policy() -> CorrectnessPolicy {
    CorrectnessPolicy::Membership
}

fn default_expected_steps() -> Vec<StepKind> {
    vec![
        StepKind::Explanation,
        StepKind::Substitution,
        StepKind::Calculation,
        StepKind::Simplification,
        StepKind::Verification,
        StepKind::Conclusion,
    ]
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_results_dir() -> String {
    "results".to_string()
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            correctness_policy: default_policy(),
            expected_steps: default_expected_steps(),
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
            sample_size: 0,
        }
    }
}

impl EvalSettings {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// expected step set is empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or if the expected
    /// step set is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        if settings.expected_steps.is_empty() {
            return Err(ConfigError::EmptyExpectedSteps);
        }
        Ok(settings)
    }

    /// Build the evaluator these settings describe.
    #[must_use]
    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(
            StepAnalyzer::new(self.expected_steps.iter().copied()),
            self.correctness_policy,
        )
    }
}
