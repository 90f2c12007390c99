use super::history::{
    average_pass_rate, calculate_failure_rate_trend, calculate_pass_rate_consistency,
    current_failure_rate, detect_flaky_tests, identify_new_failures,
};
use super::SignalExtractor;
use crate::domain::agent_artifacts::AgentArtifacts;
use crate::domain::error::Result;
use crate::domain::signal::{metadata, Signal};
use crate::domain::test_run::TestHistory;
use serde_json::json;

/// Baseline signals that need nothing beyond test results.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericExtractor;

impl GenericExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SignalExtractor for GenericExtractor {
    fn extract_signals(
        &self,
        history: &TestHistory,
        _artifacts: Option<&AgentArtifacts>,
    ) -> Result<Vec<Signal>> {
        let total_runs = history.total_runs();
        let total_tests = history.unique_test_ids().len();

        let consistency = calculate_pass_rate_consistency(history);
        let avg_pass_rate = average_pass_rate(history);
        let pass_rate_consistency = Signal::stability(
            "pass_rate_consistency",
            consistency * 100.0,
            format!("Consistency of pass rates across {} runs", total_runs),
            vec![
                format!("Pass rate consistency: {}", percent(consistency)),
                format!("Average pass rate: {}", percent(avg_pass_rate)),
            ],
            metadata([
                ("consistency", json!(consistency)),
                ("avg_pass_rate", json!(avg_pass_rate)),
            ]),
        )?;

        let flaky_tests = detect_flaky_tests(history);
        let flakiness_rate = if total_tests == 0 {
            0.0
        } else {
            flaky_tests.len() as f64 / total_tests as f64
        };
        let mut flakiness_evidence = vec![
            format!("Flaky tests detected: {}", flaky_tests.len()),
            format!("Flakiness rate: {}", percent(flakiness_rate)),
        ];
        if !flaky_tests.is_empty() {
            flakiness_evidence.push(format!("Flaky test IDs: {}", flaky_tests.join(", ")));
        }
        let test_flakiness = Signal::stability(
            "test_flakiness",
            (1.0 - flakiness_rate) * 100.0,
            format!(
                "Test flakiness rate: {} flaky test(s) out of {} total",
                flaky_tests.len(),
                total_tests
            ),
            flakiness_evidence,
            metadata([
                ("flaky_tests", json!(flaky_tests)),
                ("flakiness_rate", json!(flakiness_rate)),
            ]),
        )?;

        let trend = calculate_failure_rate_trend(history);
        let current_rate = current_failure_rate(history);
        let direction = if trend > 0.0 {
            "improving"
        } else if trend < 0.0 {
            "worsening"
        } else {
            "stable"
        };
        let failure_rate_trend = Signal::regression(
            "failure_rate_trend",
            (trend + 1.0) / 2.0 * 100.0,
            format!("Trend in failure rate across {} runs", total_runs),
            vec![
                format!("Failure rate trend: {:.2} ({})", trend, direction),
                format!("Current failure rate: {}", percent(current_rate)),
            ],
            metadata([
                ("trend", json!(trend)),
                ("current_failure_rate", json!(current_rate)),
            ]),
        )?;

        let new_failures = identify_new_failures(history);
        let new_failures_value = if total_tests == 0 {
            100.0
        } else {
            (100.0 - new_failures.len() as f64 / total_tests as f64 * 100.0).max(0.0)
        };
        let mut new_failure_evidence = vec![format!("New failures: {}", new_failures.len())];
        if !new_failures.is_empty() {
            new_failure_evidence.push(format!(
                "New failure test IDs: {}",
                new_failures.join(", ")
            ));
        }
        let new_failures_signal = Signal::regression(
            "new_failures",
            new_failures_value,
            format!("New failures detected: {} test(s)", new_failures.len()),
            new_failure_evidence,
            metadata([
                ("new_failures", json!(new_failures)),
                ("total_tests", json!(total_tests)),
            ]),
        )?;

        Ok(vec![
            pass_rate_consistency,
            test_flakiness,
            failure_rate_trend,
            new_failures_signal,
        ])
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}

/// Renders a ratio as a percentage with two decimals, e.g. `0.5` -> `50.00%`.
pub(crate) fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::SignalType;
    use crate::domain::test_case::TestStatus;
    use crate::domain::test_run::{TestExecution, TestRun};

    fn run(id: &str, outcomes: &[(&str, TestStatus)]) -> TestRun {
        let executions = outcomes
            .iter()
            .map(|(test, status)| TestExecution::new(*test, *status, 10, None).unwrap())
            .collect();
        TestRun::new(id, None, executions).unwrap()
    }

    #[test]
    fn test_stable_single_run() {
        let history = TestHistory::new(vec![run(
            "r1",
            &[("A", TestStatus::Passed), ("B", TestStatus::Passed)],
        )])
        .unwrap();
        let signals = GenericExtractor::new().extract_signals(&history, None).unwrap();

        assert_eq!(signals.len(), 4);
        assert_eq!(signals[0].value(), 100.0);
        assert_eq!(signals[0].evidence()[0], "Pass rate consistency: 100.00%");
        assert_eq!(signals[1].value(), 100.0);
        assert_eq!(signals[1].evidence().len(), 2);
        assert_eq!(signals[2].value(), 50.0);
        assert_eq!(signals[2].evidence()[0], "Failure rate trend: 0.00 (stable)");
        assert_eq!(signals[3].value(), 100.0);
        assert_eq!(signals[3].signal_type(), SignalType::Regression);
    }

    #[test]
    fn test_flaky_and_new_failures_are_listed() {
        let history = TestHistory::new(vec![
            run("r1", &[("A", TestStatus::Passed), ("B", TestStatus::Passed)]),
            run("r2", &[("A", TestStatus::Failed), ("B", TestStatus::Passed)]),
        ])
        .unwrap();
        let signals = GenericExtractor::new().extract_signals(&history, None).unwrap();

        let flakiness = &signals[1];
        assert_eq!(flakiness.value(), 50.0);
        assert_eq!(flakiness.evidence()[2], "Flaky test IDs: A");
        assert_eq!(flakiness.metadata()["flaky_tests"], json!(["A"]));

        let trend = &signals[2];
        assert_eq!(trend.value(), 25.0);
        assert!(trend.evidence()[0].ends_with("(worsening)"));

        let new_failures = &signals[3];
        assert_eq!(new_failures.value(), 50.0);
        assert_eq!(new_failures.evidence()[1], "New failure test IDs: A");
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(0.5), "50.00%");
        assert_eq!(percent(1.0 / 3.0), "33.33%");
    }
}
