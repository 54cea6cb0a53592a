//! Check results and the verdict derived from them.
//!
//! # Invariants
//! - A `CheckResult` never changes after construction
//! - `ResultList` order is the reveal order and is never rearranged

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single detection check.
///
/// `passed == true` means the check found evidence of root access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    label: String,
    passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl CheckResult {
    pub fn new(label: impl Into<String>, passed: bool) -> Self {
        Self {
            label: label.into(),
            passed,
            detail: None,
        }
    }

    /// Attach a free-form detail line (builder style, consumes `self`).
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Ordered results of one detector invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultList(Vec<CheckResult>);

impl ResultList {
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self(results)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CheckResult> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CheckResult> {
        self.0.iter()
    }

    /// Aggregate verdict over every result in the list.
    pub fn verdict(&self) -> Verdict {
        Verdict::from_results(&self.0)
    }
}

impl From<Vec<CheckResult>> for ResultList {
    fn from(results: Vec<CheckResult>) -> Self {
        Self(results)
    }
}

impl FromIterator<CheckResult> for ResultList {
    fn from_iter<I: IntoIterator<Item = CheckResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResultList {
    type Item = &'a CheckResult;
    type IntoIter = std::slice::Iter<'a, CheckResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Final conclusion of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// At least one check found root evidence
    Rooted,
    /// No check found root evidence (including the empty run)
    NotRooted,
    /// The detector failed; the run carried no results
    Failed { reason: String },
}

impl Verdict {
    /// Logical OR of `passed` across `results`.
    ///
    /// # Property
    /// `from_results(&[]) == NotRooted`
    pub fn from_results(results: &[CheckResult]) -> Self {
        if results.iter().any(CheckResult::passed) {
            Verdict::Rooted
        } else {
            Verdict::NotRooted
        }
    }

    pub fn is_rooted(&self) -> bool {
        matches!(self, Verdict::Rooted)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failed { .. })
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Rooted => write!(f, "ROOTED"),
            Verdict::NotRooted => write!(f, "NOT ROOTED"),
            Verdict::Failed { reason } => write!(f, "CHECK FAILED: {}", reason),
        }
    }
}

/// Identifier of one run, from trigger to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a fresh run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_is_rooted_when_any_check_passes() {
        let results = ResultList::new(vec![
            CheckResult::new("A", false),
            CheckResult::new("B", true),
            CheckResult::new("C", false),
        ]);
        assert_eq!(results.verdict(), Verdict::Rooted);
    }

    #[test]
    fn verdict_is_not_rooted_when_every_check_fails() {
        let results: ResultList = ["A", "B"]
            .into_iter()
            .map(|label| CheckResult::new(label, false))
            .collect();
        assert_eq!(results.verdict(), Verdict::NotRooted);
    }

    #[test]
    fn empty_list_is_not_rooted() {
        assert_eq!(ResultList::default().verdict(), Verdict::NotRooted);
        assert!(!Verdict::from_results(&[]).is_rooted());
    }

    #[test]
    fn failed_verdict_is_neither_rooted_nor_silent() {
        let verdict = Verdict::Failed {
            reason: "detector exited with 2".to_string(),
        };
        assert!(!verdict.is_rooted());
        assert!(verdict.is_failure());
        assert_eq!(verdict.to_string(), "CHECK FAILED: detector exited with 2");
    }

    #[test]
    fn check_result_deserializes_without_detail() {
        let result: CheckResult =
            serde_json::from_str(r#"{"label":"su binary","passed":true}"#).unwrap();
        assert_eq!(result.label(), "su binary");
        assert!(result.passed());
        assert_eq!(result.detail(), None);
    }

    #[test]
    fn verdict_serializes_with_tag() {
        let json = serde_json::to_value(Verdict::Failed {
            reason: "timeout".to_string(),
        })
        .unwrap();
        assert_eq!(json["verdict"], "failed");
        assert_eq!(json["reason"], "timeout");
    }
}
