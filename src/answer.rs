//! Final-answer extraction, normalization, and correctness checking.
//!
//! Extraction recognizes only unsigned decimal integers/decimals; symbolic
//! answers (fractions, units, π) fall through to the raw-string fallback in
//! normalization and are a documented weak spot of the numeric pipeline,
//! not a supported feature.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Error returned when parsing a correctness policy name fails.
#[derive(Error, Debug)]
#[error("unknown correctness policy: {0} (expected \"membership\" or \"exact_match\")")]
pub struct PolicyParseError(String);

/// Correctness decision rule, fixed for the whole evaluation run.
///
/// Mixing policies across models in one run breaks comparability, so the
/// policy is a single explicit configuration value rather than a per-call
/// argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectnessPolicy {
    /// Correct iff the normalized ground truth equals any bare numeric
    /// token found anywhere in the response (order-independent).
    Membership,
    /// Correct iff the normalized extracted final answer equals the
    /// normalized ground truth.
    ExactMatch,
}

impl FromStr for CorrectnessPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "membership" => Ok(Self::Membership),
            "exact_match" | "exact-match" | "exact" => Ok(Self::ExactMatch),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

fn labeled_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)answer[:\s]+(\d+(?:\.\d+)?)").expect("answer pattern"),
            Regex::new(r"(?i)solution[:\s]+(\d+(?:\.\d+)?)").expect("solution pattern"),
            Regex::new(r"(?i)result[:\s]+(\d+(?:\.\d+)?)").expect("result pattern"),
        ]
    })
}

fn trailing_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)(\d+(?:\.\d+)?)(?:\s*$|\s*[.\n])").expect("trailing number pattern")
    })
}

fn bare_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("bare number pattern"))
}

/// Extract the final answer token from a response.
///
/// Tries, in strict order:
/// 1. a label-prefixed number (`answer:`, `solution:`, `result:`),
///    scanning the whole text for the first match per label priority;
/// 2. a number immediately before end-of-line, a period, or end of string;
/// 3. the *last* bare number found anywhere in the text.
///
/// Returns `None` when the text contains no number at all.
#[must_use]
pub fn extract_answer(response: &str) -> Option<String> {
    if response.is_empty() {
        return None;
    }

    for pattern in labeled_patterns() {
        if let Some(caps) = pattern.captures(response) {
            return Some(caps[1].to_string());
        }
    }

    if let Some(caps) = trailing_number().captures(response) {
        return Some(caps[1].to_string());
    }

    bare_number()
        .find_iter(response)
        .last()
        .map(|m| m.as_str().to_string())
}

/// Canonicalize an answer string for equality comparison.
///
/// Lowercases, trims, strips every character that is not a digit or a
/// decimal point, then float-parses; on success the canonical float form
/// is returned (so "4", "4.0", and "4.00" normalize identically). On parse
/// failure the stripped string is returned unchanged, which means a
/// digit-free answer normalizes to the empty string. Idempotent.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match stripped.parse::<f64>() {
        Ok(value) => value.to_string(),
        Err(_) => stripped,
    }
}

/// Decide correctness of a response against the ground-truth answer.
///
/// Total over all inputs: empty response or empty ground truth is simply
/// incorrect. A ground truth that normalizes to the empty string (pure
/// symbolic answers like "π/2") cannot be matched numerically; that case
/// logs a warning because the numeric fallback is known to degrade there.
#[must_use]
pub fn check_correctness(response: &str, correct_answer: &str, policy: CorrectnessPolicy) -> bool {
    if response.is_empty() || correct_answer.is_empty() {
        return false;
    }

    let truth = normalize_answer(correct_answer);
    if truth.is_empty() {
        tracing::warn!(
            correct_answer,
            "ground truth has no numeric content; numeric correctness check cannot match it"
        );
        return false;
    }

    match policy {
        CorrectnessPolicy::Membership => bare_number()
            .find_iter(response)
            .any(|m| normalize_answer(m.as_str()) == truth),
        CorrectnessPolicy::ExactMatch => {
            extract_answer(response).is_some_and(|a| normalize_answer(&a) == truth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_labeled_answer() {
        assert_eq!(extract_answer("Answer: 4").as_deref(), Some("4"));
        assert_eq!(extract_answer("the solution: 12.5 ok").as_deref(), Some("12.5"));
        assert_eq!(extract_answer("Result: 7").as_deref(), Some("7"));
    }

    #[test]
    fn test_label_priority_over_position() {
        // "solution" appears earlier in the text, but "answer" is tried
        // first across the whole text.
        let text = "solution: 9\nanswer: 4";
        assert_eq!(extract_answer(text).as_deref(), Some("4"));
    }

    #[test]
    fn test_extract_trailing_number() {
        assert_eq!(extract_answer("we compute 8 then x = 4.").as_deref(), Some("4"));
        assert_eq!(extract_answer("the value is 42").as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_last_bare_number_fallback() {
        // No label, no number at a line/period boundary: fall back to the
        // last number anywhere.
        assert_eq!(extract_answer("between 3 and 17 units").as_deref(), Some("17"));
    }

    #[test]
    fn test_extract_no_digits() {
        assert_eq!(extract_answer("no numbers here at all"), None);
        assert_eq!(extract_answer(""), None);
        assert_eq!(extract_answer("pi over two"), None);
    }

    #[test]
    fn test_normalize_canonical_float() {
        assert_eq!(normalize_answer("4"), "4");
        assert_eq!(normalize_answer("4.0"), "4");
        assert_eq!(normalize_answer("4.00"), "4");
        assert_eq!(normalize_answer(" 12.5 "), "12.5");
        assert_eq!(normalize_answer("$1,000"), "1000");
    }

    #[test]
    fn test_normalize_symbolic_fallback() {
        assert_eq!(normalize_answer("25π"), "25");
        assert_eq!(normalize_answer("π"), "");
        assert_eq!(normalize_answer("x + y"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["4", "4.00", "25π", "π", "", "1.2.3", "answer: 17"] {
            let once = normalize_answer(raw);
            assert_eq!(normalize_answer(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_membership_policy() {
        let response = "Step 1: 2x = 8.\nStep 2: x = 4.\nAnswer: 4";
        assert!(check_correctness(response, "4", CorrectnessPolicy::Membership));
        assert!(!check_correctness(response, "5", CorrectnessPolicy::Membership));
        // Order-independent: the answer does not have to be the extracted one.
        assert!(check_correctness(response, "8", CorrectnessPolicy::Membership));
    }

    #[test]
    fn test_exact_match_policy() {
        let response = "Step 1: 2x = 8.\nStep 2: x = 4.\nAnswer: 4";
        assert!(check_correctness(response, "4", CorrectnessPolicy::ExactMatch));
        assert!(check_correctness(response, "4.0", CorrectnessPolicy::ExactMatch));
        // "8" appears in the text but is not the extracted final answer.
        assert!(!check_correctness(response, "8", CorrectnessPolicy::ExactMatch));
    }

    #[test]
    fn test_correctness_empty_inputs() {
        assert!(!check_correctness("", "4", CorrectnessPolicy::Membership));
        assert!(!check_correctness("Answer: 4", "", CorrectnessPolicy::Membership));
        assert!(!check_correctness("", "", CorrectnessPolicy::ExactMatch));
    }

    #[test]
    fn test_symbolic_ground_truth_degrades_gracefully() {
        // "25π" normalizes to "25"; the bare-number scan of the response
        // finds 25, so membership reports true. Documented degradation,
        // never a panic.
        let result = check_correctness("A = π(5)² = 25π", "25π", CorrectnessPolicy::Membership);
        assert!(result, "numeric fallback matches the digit prefix of 25π");

        // Fully digit-free truth cannot match anything.
        assert!(!check_correctness("got π", "π", CorrectnessPolicy::Membership));
        assert!(!check_correctness("got 3", "π", CorrectnessPolicy::ExactMatch));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "membership".parse::<CorrectnessPolicy>().unwrap(),
            CorrectnessPolicy::Membership
        );
        assert_eq!(
            "exact_match".parse::<CorrectnessPolicy>().unwrap(),
            CorrectnessPolicy::ExactMatch
        );
        assert_eq!(
            "EXACT".parse::<CorrectnessPolicy>().unwrap(),
            CorrectnessPolicy::ExactMatch
        );
        assert!("fuzzy".parse::<CorrectnessPolicy>().is_err());
    }
}
