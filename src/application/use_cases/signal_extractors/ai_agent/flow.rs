use super::super::generic::percent;
use crate::domain::agent_artifacts::FlowTrace;
use crate::domain::error::Result;
use crate::domain::signal::{metadata, Signal};
use serde_json::json;
use std::collections::BTreeSet;

/// Completion rate, plus an anomaly signal when every flow records its steps.
///
/// A flow counts once toward the anomalies whether it loops, terminates
/// early, or both, so the anomaly rate stays within `[0, 1]`.
pub fn analyze(flows: Option<&[FlowTrace]>) -> Result<Vec<Signal>> {
    let Some(flows) = flows.filter(|f| !f.is_empty()) else {
        return Ok(Vec::new());
    };

    let total = flows.len();
    let completed = flows.iter().filter(|f| f.is_completed()).count();
    let completion_rate = completed as f64 / total as f64;

    let mut signals = vec![Signal::stability(
        "flow_completion_rate",
        completion_rate * 100.0,
        format!("Flow completion rate: {}/{}", completed, total),
        vec![
            format!("Completed flows: {}", completed),
            format!("Total flows: {}", total),
            format!("Completion rate: {}", percent(completion_rate)),
        ],
        metadata([
            ("completion_rate", json!(completion_rate)),
            ("total", json!(total)),
        ]),
    )?];

    if flows.iter().all(|f| f.steps.is_some()) {
        let anomalies = flows.iter().filter(|f| is_anomalous(f)).count();
        let anomaly_rate = anomalies as f64 / total as f64;

        signals.push(Signal::regression(
            "flow_anomalies",
            (1.0 - anomaly_rate) * 100.0,
            format!("Flow anomalies detected: {}/{}", anomalies, total),
            vec![
                format!("Anomalous flows: {}", anomalies),
                format!("Anomaly rate: {}", percent(anomaly_rate)),
            ],
            metadata([
                ("anomaly_count", json!(anomalies)),
                ("anomaly_rate", json!(anomaly_rate)),
            ]),
        )?);
    }

    Ok(signals)
}

fn is_anomalous(flow: &FlowTrace) -> bool {
    let steps = flow.steps.as_deref().unwrap_or_default();
    let unique: BTreeSet<&String> = steps.iter().collect();
    let loops = unique.len() < steps.len();
    let ended_early = !steps.is_empty() && !flow.is_completed();
    loops || ended_early
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(status: &str, steps: Option<&[&str]>) -> FlowTrace {
        FlowTrace {
            status: Some(status.to_string()),
            steps: steps.map(|s| s.iter().map(|step| step.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_flows_yield_nothing() {
        assert!(analyze(None).unwrap().is_empty());
        assert!(analyze(Some(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_completion_counts_reached_end() {
        let flows = vec![
            flow("completed", None),
            FlowTrace {
                reached_end: Some(true),
                ..Default::default()
            },
            flow("dropped", None),
        ];
        let signals = analyze(Some(&flows)).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].description(), "Flow completion rate: 2/3");
    }

    #[test]
    fn test_loop_and_early_exit_count_once_per_flow() {
        let flows = vec![
            flow("completed", Some(&["greet", "ask", "answer"])),
            flow("dropped", Some(&["greet", "ask", "ask"])),
            flow("completed", Some(&["greet", "greet"])),
            flow("dropped", Some(&[])),
        ];
        let signals = analyze(Some(&flows)).unwrap();
        let anomalies = &signals[1];
        assert_eq!(anomalies.name(), "flow_anomalies");
        assert_eq!(anomalies.metadata()["anomaly_count"], json!(2));
        assert_eq!(anomalies.value(), 50.0);
    }

    #[test]
    fn test_reached_end_without_status_is_not_an_early_exit() {
        let flows = vec![
            FlowTrace {
                reached_end: Some(true),
                steps: Some(vec!["greet".into(), "answer".into()]),
                ..Default::default()
            },
            flow("completed", Some(&["greet", "answer"])),
        ];
        let signals = analyze(Some(&flows)).unwrap();
        assert_eq!(signals[1].metadata()["anomaly_count"], json!(0));
        assert_eq!(signals[1].value(), 100.0);
    }
}
