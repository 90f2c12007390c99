use crate::domain::drift::{DriftReport, LlmSignals};
use crate::domain::metrics::LLM_METRIC_KEYS;
use crate::domain::transcript::AiSignal;
use serde_json::Value;

/// `- **SEV** title` followed by one indented line per evidence entry.
pub fn signals_to_markdown(signals: &[AiSignal]) -> String {
    let mut lines = Vec::new();
    for signal in signals {
        lines.push(format!(
            "- **{}** {}",
            signal.severity.to_string().to_uppercase(),
            signal.title
        ));
        for (key, value) in &signal.evidence {
            lines.push(format!("  - {}: {}", key, evidence_text(value)));
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    }
}

/// Advisory section appended to the readiness report. The optional drift
/// block compares `current` against `baseline`.
pub fn build_stability_section(current: &LlmSignals, drift: Option<&DriftReport>) -> String {
    let mut lines = vec![
        "## AI/LLM Stability Signals (optional)".to_string(),
        String::new(),
        "_Advisory only: does not modify the deterministic core readiness score._".to_string(),
        String::new(),
        signals_to_markdown(&current.signals).trim_end().to_string(),
        String::new(),
    ];
    if let Some(path) = &current.source_path {
        let digest = current.source_digest.as_deref().unwrap_or("n/a");
        lines.insert(4, format!("_Transcript: `{}` (sha256 `{}`)_", path, digest));
        lines.insert(5, String::new());
    }
    if let Some(drift) = drift {
        lines.extend(drift_markdown(drift));
    }
    lines.join("\n").trim_end().to_string() + "\n"
}

pub fn drift_markdown(drift: &DriftReport) -> Vec<String> {
    let mut out = vec![
        "### Drift vs Baseline (optional)".to_string(),
        String::new(),
        "| Metric | Baseline | Current | Δ |".to_string(),
        "|---|---:|---:|---:|".to_string(),
    ];
    for key in LLM_METRIC_KEYS {
        let baseline = drift
            .baseline
            .metrics
            .get(key)
            .map_or_else(|| "0".to_string(), |v| v.to_string());
        let current = drift
            .current
            .metrics
            .get(key)
            .map_or_else(|| "0".to_string(), |v| v.to_string());
        let delta = drift.deltas.get(key).copied().unwrap_or(0.0);
        out.push(format!(
            "| `{}` | {} | {} | {:.3} |",
            key, baseline, current, delta
        ));
    }
    out.push(String::new());

    out.push("#### Findings".to_string());
    out.push(String::new());
    if drift.findings.is_empty() {
        out.push("- _No drift detected._".to_string());
    }
    for finding in &drift.findings {
        out.push(format!(
            "- **{}**: {}",
            finding.severity.as_str().to_uppercase(),
            finding.explanation
        ));
    }
    out.push(String::new());
    out
}

/// Standalone drift report written by the `drift` command.
pub fn build_drift_report(drift: &DriftReport) -> String {
    let mut lines = vec!["# LLM Drift Report".to_string(), String::new()];
    for (label, signals) in [("Baseline", &drift.baseline), ("Current", &drift.current)] {
        lines.push(format!(
            "- {}: `{}`",
            label,
            signals.source_path.as_deref().unwrap_or("in-memory")
        ));
    }
    lines.push(String::new());
    lines.extend(drift_markdown(drift));
    lines.join("\n").trim_end().to_string() + "\n"
}

fn evidence_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::drift_analyzer::{compare_signals, summarize_transcript};
    use crate::domain::transcript::{AiSeverity, Transcript, TranscriptTurn};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn turn(label: &str, schema_ok: bool, tool_status: &str) -> TranscriptTurn {
        TranscriptTurn {
            user_text: Some("Call the tool".to_string()),
            assistant_text: Some("done".to_string()),
            assistant_label: Some(label.to_string()),
            expected_schema_valid: Some(schema_ok),
            refusal: Some(false),
            tool_calls: Some(vec![json!({"name": "fetch", "status": tool_status})]),
        }
    }

    #[test]
    fn test_signals_to_markdown_format() {
        let signal = AiSignal {
            severity: AiSeverity::Medium,
            title: "Refusal rate".to_string(),
            evidence: BTreeMap::from([
                ("refusal_turns".to_string(), json!(1)),
                ("turns_total".to_string(), json!(8)),
            ]),
        };
        assert_eq!(
            signals_to_markdown(&[signal]),
            "- **MEDIUM** Refusal rate\n  - refusal_turns: 1\n  - turns_total: 8\n"
        );
        assert_eq!(signals_to_markdown(&[]), "");
    }

    #[test]
    fn test_stability_section_with_drift() {
        let baseline = summarize_transcript(&Transcript::new(vec![
            turn("a", true, "ok"),
            turn("a", true, "ok"),
        ]))
        .unwrap();
        let current = summarize_transcript(&Transcript::new(vec![
            turn("a", true, "ok"),
            turn("b", false, "error"),
        ]))
        .unwrap();
        let drift = compare_signals(&baseline, &current);
        let md = build_stability_section(&current, Some(&drift));

        assert!(md.starts_with("## AI/LLM Stability Signals (optional)\n"));
        assert!(md.contains("_Advisory only: does not modify the deterministic core readiness score._"));
        assert!(md.contains("### Drift vs Baseline (optional)"));
        assert!(md.contains("| Metric | Baseline | Current | Δ |"));
        assert!(md.contains("| `tool_error_rate` | 0.000 | 0.500 | 0.500 |"));
        assert!(md.contains("| `turns_total` | 2 | 2 | 0.000 |"));
        assert!(md.contains("- **HIGH**: Tool error rate increased by 0.500 (absolute)"));
        assert!(md.contains("- **HIGH**: Repeated-prompt label variability increased by 1"));
        assert!(md.ends_with("\n"));
    }

    #[test]
    fn test_no_drift_fallback() {
        let summary = summarize_transcript(&Transcript::default()).unwrap();
        let drift = compare_signals(&summary, &summary);
        let lines = drift_markdown(&drift);
        assert!(lines.contains(&"- _No drift detected._".to_string()));
        assert!(build_drift_report(&drift).contains("- Baseline: `in-memory`"));
    }
}
