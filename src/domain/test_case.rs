use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A test case declared in the test management export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub priority: Option<String>,
    pub component: Option<String>,
    pub description: Option<String>,
}

/// Execution status of a single test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }

    /// Failed and errored executions both count as failing for history analysis.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestStatus {
    type Err = String;

    // Exact, case-sensitive match. Alias handling belongs to the normalizer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown test status: {}", s)),
        }
    }
}

/// A single result row. `id` references a [`TestCase`] but may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub status: TestStatus,
    pub duration_sec: Option<f64>,
    pub raw_name: Option<String>,
}

/// Test cases keyed by id plus the ordered result sequence of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedData {
    pub test_cases: BTreeMap<String, TestCase>,
    pub results: Vec<TestResult>,
}

impl NormalizedData {
    pub fn new(test_cases: BTreeMap<String, TestCase>, results: Vec<TestResult>) -> Self {
        Self { test_cases, results }
    }

    pub fn is_mapped(&self, result: &TestResult) -> bool {
        self.test_cases.contains_key(&result.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert_eq!("failed".parse::<TestStatus>(), Ok(TestStatus::Failed));
        assert!("Failed".parse::<TestStatus>().is_err());
        assert!("FAILED".parse::<TestStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TestStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
        assert!(TestStatus::Error.is_failure());
        assert!(!TestStatus::Skipped.is_failure());
    }
}
