//! Step classification for free-form solution text.
//!
//! Splits a response into lines and tags each line with zero or one
//! reasoning-step kind using a fixed, ordered rule table. The first
//! matching rule wins; lines matching no rule are dropped. Rule order is
//! part of the observable behavior — reordering changes classification
//! and requires a version bump.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The fixed set of reasoning-step kinds a line can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Arithmetic expression with an explicit result (`3 + 4 = 7`)
    Calculation,
    /// Single-letter variable assignment (`x = 4`)
    Equation,
    /// Named function applied and evaluated (`f(x) = 9`)
    Formula,
    /// Causal/reasoning connective ("because", "therefore", ...)
    Explanation,
    /// Value-plugging language ("substituting", "plugging in")
    Substitution,
    /// Reduction language ("simplifying", "combining")
    Simplification,
    /// Checking language ("verifying", "confirming")
    Verification,
    /// Final-answer language ("we get", "we obtain")
    Conclusion,
}

impl StepKind {
    /// All kinds, in rule-priority order.
    pub const ALL: [Self; 8] = [
        Self::Calculation,
        Self::Equation,
        Self::Formula,
        Self::Explanation,
        Self::Substitution,
        Self::Simplification,
        Self::Verification,
        Self::Conclusion,
    ];

    /// Stable snake_case name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calculation => "calculation",
            Self::Equation => "equation",
            Self::Formula => "formula",
            Self::Explanation => "explanation",
            Self::Substitution => "substitution",
            Self::Simplification => "simplification",
            Self::Verification => "verification",
            Self::Conclusion => "conclusion",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified unit of reasoning extracted from a response line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Classified kind
    pub kind: StepKind,
    /// The source line, unmodified apart from whitespace trimming
    pub content: String,
    /// Index of this step within the response, in order of appearance
    pub position: usize,
}

/// Ordered first-match step classifier.
///
/// Patterns are compiled once at construction. The rule table is fixed:
/// classification must stay reproducible across runs and deployments.
#[derive(Debug)]
pub struct StepClassifier {
    rules: Vec<(StepKind, Regex)>,
    marker: Regex,
}

impl StepClassifier {
    /// Build the classifier with the canonical rule table.
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile, which would be a
    /// programming error caught by the test suite.
    #[must_use]
    pub fn new() -> Self {
        let table: [(StepKind, &str); 8] = [
            (StepKind::Calculation, r"(?i)\d+\s*[+\-*/]\s*\d+\s*=\s*\d+"),
            (StepKind::Equation, r"(?i)[a-z]\s*=\s*\d+"),
            (StepKind::Formula, r"(?i)[a-z]\([^)]+\)\s*=\s*\d+"),
            (
                StepKind::Explanation,
                r"(?i)because|since|therefore|thus|hence|as a result",
            ),
            (
                StepKind::Substitution,
                r"(?i)substituting|replacing|plugging in",
            ),
            (
                StepKind::Simplification,
                r"(?i)simplifying|reducing|combining",
            ),
            (
                StepKind::Verification,
                r"(?i)checking|verifying|confirming",
            ),
            (
                StepKind::Conclusion,
                r"(?i)therefore|thus|hence|we get|we obtain",
            ),
        ];

        let rules = table
            .into_iter()
            .map(|(kind, pattern)| {
                let re = Regex::new(pattern).expect("built-in step pattern must compile");
                (kind, re)
            })
            .collect();

        // Leading enumeration markers ("1.", "2)", "-", "*") are stripped
        // before matching so they cannot trigger the numeric rules.
        let marker = Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+").expect("marker pattern must compile");

        Self { rules, marker }
    }

    /// Classify a single line, returning the first matching kind in
    /// rule-declaration order, or `None` if no rule applies.
    #[must_use]
    pub fn classify_line(&self, line: &str) -> Option<StepKind> {
        let stripped = self.marker.replace(line, "");
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&stripped))
            .map(|(kind, _)| *kind)
    }

    /// Extract classified steps from a full response.
    ///
    /// Blank lines are skipped; unmatched lines are dropped rather than
    /// tagged as unknown. Step positions index into the resulting list.
    #[must_use]
    pub fn extract_steps(&self, response: &str) -> Vec<Step> {
        let mut steps = Vec::new();

        for line in response.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(kind) = self.classify_line(line) {
                steps.push(Step {
                    kind,
                    content: line.to_string(),
                    position: steps.len(),
                });
            }
        }

        steps
    }
}

impl Default for StepClassifier {
    fn default() -> Self {
        Self::new()
    }
}
