//! Loaders for the optional run-history and AI-agent artifact files.

use crate::domain::agent_artifacts::AgentArtifacts;
use crate::domain::error::{AppError, Result};
use crate::domain::test_case::TestStatus;
use crate::domain::test_run::{TestExecution, TestHistory, TestRun};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct HistoryFile {
    runs: Vec<RunRecord>,
}

#[derive(Debug, Deserialize)]
struct RunRecord {
    run_id: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    results: Vec<ExecutionRecord>,
}

#[derive(Debug, Deserialize)]
struct ExecutionRecord {
    test_id: String,
    status: TestStatus,
    #[serde(default)]
    duration_ms: i64,
    #[serde(default)]
    error_message: Option<String>,
}

pub fn load_history(path: &Path) -> Result<TestHistory> {
    let content = read(path)?;
    let history = parse_history(&content)?;
    tracing::info!(
        path = %path.display(),
        runs = history.total_runs(),
        "Run history loaded"
    );
    Ok(history)
}

/// Runs go through the domain constructors, so an empty run or a negative
/// duration is rejected here rather than skewing the signals later.
pub fn parse_history(content: &str) -> Result<TestHistory> {
    let file: HistoryFile = serde_json::from_str(content)?;
    let runs = file
        .runs
        .into_iter()
        .map(|run| {
            let executions = run
                .results
                .into_iter()
                .map(|r| TestExecution::new(r.test_id, r.status, r.duration_ms, r.error_message))
                .collect::<Result<Vec<_>>>()?;
            TestRun::new(run.run_id, run.timestamp, executions)
        })
        .collect::<Result<Vec<_>>>()?;
    TestHistory::new(runs)
}

pub fn load_artifacts(path: &Path) -> Result<AgentArtifacts> {
    let content = read(path)?;
    let artifacts: AgentArtifacts = serde_json::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        conversations = artifacts.conversations.as_ref().map_or(0, Vec::len),
        intents = artifacts.intents.as_ref().map_or(0, Vec::len),
        flows = artifacts.flows.as_ref().map_or(0, Vec::len),
        "Agent artifacts loaded"
    );
    Ok(artifacts)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("File not found: {}", path.display()))
        }
        _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_in_file_order() {
        let history = parse_history(
            r#"{"runs": [
                {"run_id": "r1", "timestamp": "2026-01-01T00:00:00Z",
                 "results": [{"test_id": "A", "status": "passed", "duration_ms": 12}]},
                {"run_id": "r2",
                 "results": [{"test_id": "A", "status": "error", "error_message": "boom"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(history.total_runs(), 2);
        assert_eq!(history.runs()[0].run_id(), "r1");
        assert!(history.runs()[0].timestamp().is_some());
        let latest = &history.runs()[1].executions()[0];
        assert_eq!(latest.status(), TestStatus::Error);
        assert_eq!(latest.error_message(), Some("boom"));
    }

    #[test]
    fn test_invalid_history_is_rejected() {
        let empty_run = r#"{"runs": [{"run_id": "r1", "results": []}]}"#;
        assert!(matches!(
            parse_history(empty_run).unwrap_err(),
            AppError::ValidationError(_)
        ));

        let negative = r#"{"runs": [{"run_id": "r1",
            "results": [{"test_id": "A", "status": "passed", "duration_ms": -1}]}]}"#;
        assert!(matches!(
            parse_history(negative).unwrap_err(),
            AppError::ValidationError(_)
        ));

        assert!(matches!(
            parse_history(r#"{"runs": []}"#).unwrap_err(),
            AppError::ValidationError(_)
        ));

        let bad_status = r#"{"runs": [{"run_id": "r1",
            "results": [{"test_id": "A", "status": "green"}]}]}"#;
        assert!(matches!(
            parse_history(bad_status).unwrap_err(),
            AppError::ParseError(_)
        ));
    }

    #[test]
    fn test_load_artifacts_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        std::fs::write(
            &path,
            r#"{"intents": [{"predicted": "refund", "actual": "refund", "type": "support"}]}"#,
        )
        .unwrap();

        let artifacts = load_artifacts(&path).unwrap();
        assert!(artifacts.conversations.is_none());
        let intents = artifacts.intents.unwrap();
        assert_eq!(intents[0].kind.as_deref(), Some("support"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(matches!(
            load_history(Path::new("/no/such/history.json")).unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
