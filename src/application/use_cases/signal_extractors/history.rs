//! Run-to-run stability and regression helpers over a [`TestHistory`].

use crate::domain::test_case::TestStatus;
use crate::domain::test_run::{TestHistory, TestRun};
use std::collections::BTreeSet;

/// Number of most recent runs considered "current".
const CURRENT_WINDOW: usize = 3;

/// `1 - 2σ` of the per-run pass rates, clamped to `[0, 1]`.
///
/// σ of values in `[0, 1]` never exceeds 0.5, so the scale spans the whole
/// range. A single run is perfectly consistent with itself.
pub fn calculate_pass_rate_consistency(history: &TestHistory) -> f64 {
    if history.total_runs() < 2 {
        return 1.0;
    }
    let rates: Vec<f64> = history.runs().iter().map(TestRun::pass_rate).collect();
    (1.0 - 2.0 * std_dev(&rates)).clamp(0.0, 1.0)
}

/// Tests that both passed and failed somewhere in the history, sorted by id.
pub fn detect_flaky_tests(history: &TestHistory) -> Vec<String> {
    history
        .unique_test_ids()
        .into_iter()
        .filter(|id| {
            let executions = history.test_history(id);
            let passed = executions.iter().any(|e| e.status() == TestStatus::Passed);
            let failed = executions.iter().any(|e| e.status().is_failure());
            passed && failed
        })
        .map(str::to_string)
        .collect()
}

/// Older-half mean failure rate minus recent-half mean, in `[-1, 1]`.
///
/// Positive values mean failures are going down.
pub fn calculate_failure_rate_trend(history: &TestHistory) -> f64 {
    let runs = history.runs();
    if runs.len() < 2 {
        return 0.0;
    }
    let (older, recent) = runs.split_at(runs.len() / 2);
    (mean_failure_rate(older) - mean_failure_rate(recent)).clamp(-1.0, 1.0)
}

/// Tests failing in the latest run that never failed in an earlier run.
pub fn identify_new_failures(history: &TestHistory) -> Vec<String> {
    let Some((latest, earlier)) = history.runs().split_last() else {
        return Vec::new();
    };
    if earlier.is_empty() {
        return Vec::new();
    }

    let previously_failing: BTreeSet<&str> = earlier
        .iter()
        .flat_map(|run| run.executions().iter())
        .filter(|e| e.status().is_failure())
        .map(|e| e.test_id())
        .collect();

    let new_failures: BTreeSet<&str> = latest
        .executions()
        .iter()
        .filter(|e| e.status().is_failure() && !previously_failing.contains(e.test_id()))
        .map(|e| e.test_id())
        .collect();

    new_failures.into_iter().map(str::to_string).collect()
}

/// Failed / total over the most recent runs.
pub fn current_failure_rate(history: &TestHistory) -> f64 {
    let runs = history.runs();
    let window = &runs[runs.len().saturating_sub(CURRENT_WINDOW)..];
    let failed: usize = window.iter().map(TestRun::failed_count).sum();
    let total: usize = window.iter().map(TestRun::total_tests).sum();
    if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64
    }
}

pub fn average_pass_rate(history: &TestHistory) -> f64 {
    let runs = history.runs();
    runs.iter().map(TestRun::pass_rate).sum::<f64>() / runs.len() as f64
}

fn mean_failure_rate(runs: &[TestRun]) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(TestRun::failure_rate).sum::<f64>() / runs.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_run::TestExecution;

    fn run(id: &str, outcomes: &[(&str, TestStatus)]) -> TestRun {
        let executions = outcomes
            .iter()
            .map(|(test, status)| TestExecution::new(*test, *status, 1, None).unwrap())
            .collect();
        TestRun::new(id, None, executions).unwrap()
    }

    fn history(runs: Vec<TestRun>) -> TestHistory {
        TestHistory::new(runs).unwrap()
    }

    #[test]
    fn test_single_run_defaults() {
        let h = history(vec![run("r1", &[("A", TestStatus::Failed)])]);
        assert_eq!(calculate_pass_rate_consistency(&h), 1.0);
        assert_eq!(calculate_failure_rate_trend(&h), 0.0);
        assert!(identify_new_failures(&h).is_empty());
        assert_eq!(current_failure_rate(&h), 1.0);
    }

    #[test]
    fn test_consistency_drops_with_pass_rate_swings() {
        let steady = history(vec![
            run("r1", &[("A", TestStatus::Passed), ("B", TestStatus::Failed)]),
            run("r2", &[("A", TestStatus::Passed), ("B", TestStatus::Failed)]),
        ]);
        assert_eq!(calculate_pass_rate_consistency(&steady), 1.0);

        let swinging = history(vec![
            run("r1", &[("A", TestStatus::Passed)]),
            run("r2", &[("A", TestStatus::Failed)]),
        ]);
        assert_eq!(calculate_pass_rate_consistency(&swinging), 0.0);
    }

    #[test]
    fn test_flaky_tests_need_pass_and_failure() {
        let h = history(vec![
            run("r1", &[("A", TestStatus::Passed), ("B", TestStatus::Skipped), ("C", TestStatus::Error)]),
            run("r2", &[("A", TestStatus::Error), ("B", TestStatus::Failed), ("C", TestStatus::Passed)]),
        ]);
        assert_eq!(detect_flaky_tests(&h), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_trend_is_positive_when_improving() {
        let h = history(vec![
            run("r1", &[("A", TestStatus::Failed), ("B", TestStatus::Failed)]),
            run("r2", &[("A", TestStatus::Failed), ("B", TestStatus::Passed)]),
            run("r3", &[("A", TestStatus::Passed), ("B", TestStatus::Passed)]),
            run("r4", &[("A", TestStatus::Passed), ("B", TestStatus::Passed)]),
        ]);
        assert!((calculate_failure_rate_trend(&h) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_new_failures_exclude_known_failures() {
        let h = history(vec![
            run("r1", &[("A", TestStatus::Failed), ("B", TestStatus::Passed)]),
            run("r2", &[("A", TestStatus::Failed), ("B", TestStatus::Error), ("C", TestStatus::Failed)]),
        ]);
        assert_eq!(identify_new_failures(&h), vec!["B".to_string(), "C".to_string()]);
    }
}
