use crate::domain::error::{AppError, Result};
use crate::domain::test_case::{NormalizedData, TestStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// One execution of one test inside a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestExecution {
    test_id: String,
    status: TestStatus,
    duration_ms: i64,
    error_message: Option<String>,
}

impl TestExecution {
    pub fn new(
        test_id: impl Into<String>,
        status: TestStatus,
        duration_ms: i64,
        error_message: Option<String>,
    ) -> Result<Self> {
        let test_id = test_id.into();
        if test_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "test_id cannot be empty".to_string(),
            ));
        }
        if duration_ms < 0 {
            return Err(AppError::ValidationError(format!(
                "duration_ms must be non-negative (test_id={})",
                test_id
            )));
        }
        Ok(Self {
            test_id,
            status,
            duration_ms,
            error_message,
        })
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// A single test run. Always holds at least one execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRun {
    run_id: String,
    timestamp: Option<DateTime<Utc>>,
    executions: Vec<TestExecution>,
}

impl TestRun {
    pub fn new(
        run_id: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
        executions: Vec<TestExecution>,
    ) -> Result<Self> {
        let run_id = run_id.into();
        if run_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "run_id cannot be empty".to_string(),
            ));
        }
        if executions.is_empty() {
            return Err(AppError::ValidationError(format!(
                "run {} has no results",
                run_id
            )));
        }
        Ok(Self {
            run_id,
            timestamp,
            executions,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn executions(&self) -> &[TestExecution] {
        &self.executions
    }

    pub fn total_tests(&self) -> usize {
        self.executions.len()
    }

    pub fn passed_count(&self) -> usize {
        self.count_status(TestStatus::Passed)
    }

    pub fn failed_count(&self) -> usize {
        self.count_status(TestStatus::Failed)
    }

    pub fn pass_rate(&self) -> f64 {
        self.passed_count() as f64 / self.total_tests() as f64
    }

    pub fn failure_rate(&self) -> f64 {
        self.failed_count() as f64 / self.total_tests() as f64
    }

    fn count_status(&self, status: TestStatus) -> usize {
        self.executions
            .iter()
            .filter(|e| e.status == status)
            .count()
    }
}

/// Ordered run history, oldest first. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestHistory {
    runs: Vec<TestRun>,
}

impl TestHistory {
    pub fn new(runs: Vec<TestRun>) -> Result<Self> {
        if runs.is_empty() {
            return Err(AppError::ValidationError(
                "test_runs cannot be empty".to_string(),
            ));
        }
        Ok(Self { runs })
    }

    /// Builds a one-run history from the current normalized results.
    ///
    /// Returns `Ok(None)` when there are no results to build a run from.
    pub fn from_normalized(data: &NormalizedData, run_id: &str) -> Result<Option<Self>> {
        if data.results.is_empty() {
            return Ok(None);
        }
        let executions = data
            .results
            .iter()
            .map(|r| {
                let duration_ms = r
                    .duration_sec
                    .map(|sec| (sec * 1000.0).round() as i64)
                    .unwrap_or(0);
                TestExecution::new(r.id.clone(), r.status, duration_ms, None)
            })
            .collect::<Result<Vec<_>>>()?;
        let run = TestRun::new(run_id, None, executions)?;
        Ok(Some(Self::new(vec![run])?))
    }

    pub fn runs(&self) -> &[TestRun] {
        &self.runs
    }

    pub fn total_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn unique_test_ids(&self) -> BTreeSet<&str> {
        self.runs
            .iter()
            .flat_map(|run| run.executions.iter().map(|e| e.test_id.as_str()))
            .collect()
    }

    pub fn test_history(&self, test_id: &str) -> Vec<&TestExecution> {
        self.runs
            .iter()
            .flat_map(|run| run.executions.iter())
            .filter(|e| e.test_id == test_id)
            .collect()
    }
}
