//! Boundary I/O: problem datasets, provider responses, and persisted
//! evaluation records.
//!
//! This is the only layer allowed to fail: corrupt structured input fails
//! fast with a descriptive error. Missing or null fields inside otherwise
//! well-formed records are recovered as absent values and flow into the
//! core as such.

use crate::evaluate::{EvaluationRecord, ModelResponse, Problem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur at the dataset boundary
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("data directory not found: {0}")]
    NotFound(String),

    #[error("no problems found in dataset")]
    Empty,

    #[error("problem {0} is missing required field {1}")]
    MissingField(String, &'static str),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One provider response as persisted at the boundary. All fields are
/// optional: a well-formed entry with gaps is recovered, not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Solution text
    #[serde(default)]
    pub solution: Option<String>,
    /// Self-reported problem category
    #[serde(default)]
    pub category: Option<String>,
    /// Provider latency in milliseconds
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    /// Collaborator-assigned error tag
    #[serde(default)]
    pub error_type: Option<String>,
}

/// Responses keyed by problem id, then model name. A `null` model entry
/// means the provider failed for that problem.
pub type ResponseSet = BTreeMap<String, BTreeMap<String, Option<RawResponse>>>;

/// Evaluation records keyed by problem id, then model name. This tree is
/// the persisted source of truth; aggregates are always recomputed from it.
pub type RecordTree = BTreeMap<String, BTreeMap<String, EvaluationRecord>>;

/// Load problems from every `*.csv` file in a directory.
///
/// Expected columns: `problem_id`, `question`, `correct_answer`, and
/// optionally `category` and `difficulty`. Empty optional columns are
/// treated as absent.
///
/// # Errors
///
/// Returns an error if the directory does not exist, a file cannot be
/// parsed, a required field is empty, or no problems were found.
pub fn load_problems<P: AsRef<Path>>(dir: P) -> Result<Vec<Problem>, DatasetError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(DatasetError::NotFound(dir.display().to_string()));
    }

    let mut problems = Vec::new();

    let pattern = dir.join("*.csv");
    let mut paths: Vec<_> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(Result::ok)
        .collect();
    paths.sort();

    for path in paths {
        let mut reader = csv::Reader::from_path(&path)?;
        for row in reader.deserialize::<Problem>() {
            let mut problem = row?;
            problem.category = problem.category.filter(|c| !c.is_empty());
            problem.difficulty = problem.difficulty.filter(|d| !d.is_empty());

            if problem.problem_id.is_empty() {
                return Err(DatasetError::MissingField(
                    path.display().to_string(),
                    "problem_id",
                ));
            }
            if problem.correct_answer.is_empty() {
                return Err(DatasetError::MissingField(problem.problem_id, "correct_answer"));
            }
            problems.push(problem);
        }
    }

    if problems.is_empty() {
        return Err(DatasetError::Empty);
    }

    tracing::info!(count = problems.len(), dir = %dir.display(), "loaded problems");
    Ok(problems)
}

/// Load problems, falling back to the built-in sample problem when the
/// directory is missing or holds no CSV data.
#[must_use]
pub fn load_problems_or_sample<P: AsRef<Path>>(dir: P) -> Vec<Problem> {
    match load_problems(dir) {
        Ok(problems) => problems,
        Err(err) => {
            tracing::warn!(%err, "no dataset available, using sample problem");
            vec![Problem::sample()]
        }
    }
}

/// Sample up to `n` problems uniformly at random; `n == 0` keeps all.
#[must_use]
pub fn sample_problems(mut problems: Vec<Problem>, n: usize) -> Vec<Problem> {
    use rand::seq::SliceRandom;

    if n == 0 || n >= problems.len() {
        return problems;
    }
    let mut rng = rand::thread_rng();
    problems.shuffle(&mut rng);
    problems.truncate(n);
    problems
}

/// Load a response set from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is corrupt.
/// No partial recovery is attempted on malformed structure.
pub fn load_responses<P: AsRef<Path>>(path: P) -> Result<ResponseSet, DatasetError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Convert one problem's raw response entries to typed model responses.
/// A `null` entry becomes a missing-response marker for that model.
#[must_use]
pub fn to_model_responses(entries: &BTreeMap<String, Option<RawResponse>>) -> Vec<ModelResponse> {
    entries
        .iter()
        .map(|(model_name, raw)| match raw {
            Some(raw) => ModelResponse {
                model_name: model_name.clone(),
                raw_text: raw.solution.clone(),
                predicted_category: raw.category.clone(),
                response_time: raw.response_time_ms.map(Duration::from_millis),
                error_type: raw.error_type.clone(),
            },
            None => ModelResponse::missing(model_name),
        })
        .collect()
}

/// Arrange flat records into the persisted problem/model tree.
#[must_use]
pub fn to_record_tree(records: &[EvaluationRecord]) -> RecordTree {
    let mut tree: RecordTree = BTreeMap::new();
    for record in records {
        tree.entry(record.problem_id.clone())
            .or_default()
            .insert(record.model_name.clone(), record.clone());
    }
    tree
}

/// Flatten a persisted record tree back to the record collection.
#[must_use]
pub fn from_record_tree(tree: &RecordTree) -> Vec<EvaluationRecord> {
    tree.values()
        .flat_map(|models| models.values().cloned())
        .collect()
}

/// Persist evaluation records as a JSON tree keyed by problem and model.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_records<P: AsRef<Path>>(
    records: &[EvaluationRecord],
    path: P,
) -> Result<(), DatasetError> {
    let tree = to_record_tree(records);
    let json = serde_json::to_string_pretty(&tree)?;
    std::fs::write(&path, json)?;
    tracing::info!(count = records.len(), path = %path.as_ref().display(), "saved records");
    Ok(())
}

/// Load previously persisted evaluation records.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is corrupt.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<EvaluationRecord>, DatasetError> {
    let content = std::fs::read_to_string(path)?;
    let tree: RecordTree = serde_json::from_str(&content)?;
    Ok(from_record_tree(&tree))
}
