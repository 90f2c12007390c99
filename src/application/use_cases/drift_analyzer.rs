use crate::application::use_cases::llm_readiness::{
    extract_all_signals, REFUSAL_RATE_TITLE, SCHEMA_ERRORS_TITLE, TOOL_ERROR_RATE_TITLE,
    VARIABILITY_TITLE,
};
use crate::domain::drift::{DriftFinding, DriftReport, DriftSeverity, LlmSignals};
use crate::domain::error::{AppError, Result};
use crate::domain::metrics::{
    Metrics, ERROR_RATE, ERROR_TURNS, LLM_METRIC_KEYS, REFUSAL_RATE, REFUSAL_TURNS,
    REPEATED_PROMPTS_WITH_LABEL_VARIABILITY, TOOL_CALLS_ERROR, TOOL_CALLS_TOTAL,
    TOOL_ERROR_RATE, TURNS_TOTAL,
};
use crate::domain::transcript::{AiSignal, Transcript};
use crate::infrastructure::transcript_loader::load_transcript;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

const HIGH_RATE_DELTA: f64 = 0.10;
const MEDIUM_RATE_DELTA: f64 = 0.05;

/// Rate metrics checked for drift, with the label used in explanations.
const RATE_DRIFT_METRICS: [(&str, &str); 3] = [
    (TOOL_ERROR_RATE, "Tool error rate"),
    (REFUSAL_RATE, "Refusal rate"),
    (ERROR_RATE, "Schema/format error rate"),
];

pub fn analyze_transcript(path: impl AsRef<Path>) -> Result<LlmSignals> {
    let transcript = load_transcript(path)?;
    summarize_transcript(&transcript)
}

/// Runs the four transcript extractors and folds their evidence into the
/// nine drift metrics.
pub fn summarize_transcript(transcript: &Transcript) -> Result<LlmSignals> {
    let signals = extract_all_signals(transcript);

    let turns_total = transcript.turns.len() as u64;
    let error_turns = find_signal(&signals, SCHEMA_ERRORS_TITLE)?.evidence_count(ERROR_TURNS);
    let refusal_turns = find_signal(&signals, REFUSAL_RATE_TITLE)?.evidence_count(REFUSAL_TURNS);
    let tool = find_signal(&signals, TOOL_ERROR_RATE_TITLE)?;
    let tool_calls_total = tool.evidence_count(TOOL_CALLS_TOTAL);
    let tool_calls_error = tool.evidence_count(TOOL_CALLS_ERROR);
    let variability = find_signal(&signals, VARIABILITY_TITLE)?
        .evidence_count(REPEATED_PROMPTS_WITH_LABEL_VARIABILITY);

    let metrics = Metrics::new()
        .with(TURNS_TOTAL, turns_total)
        .with(ERROR_TURNS, error_turns)
        .with(ERROR_RATE, ratio(error_turns, turns_total))
        .with(REFUSAL_TURNS, refusal_turns)
        .with(REFUSAL_RATE, ratio(refusal_turns, turns_total))
        .with(TOOL_CALLS_TOTAL, tool_calls_total)
        .with(TOOL_CALLS_ERROR, tool_calls_error)
        .with(TOOL_ERROR_RATE, ratio(tool_calls_error, tool_calls_total))
        .with(REPEATED_PROMPTS_WITH_LABEL_VARIABILITY, variability);

    tracing::debug!(
        turns = turns_total,
        error_turns,
        tool_calls = tool_calls_total,
        "Transcript summarized"
    );

    Ok(LlmSignals {
        metrics,
        signals,
        source_path: transcript.source_path.clone(),
        source_digest: transcript.source_digest.clone(),
    })
}

/// Deltas are `current - baseline` for every drift metric. Findings come out
/// ordered high, medium, low, info; equal severities keep the order in which
/// they were checked.
pub fn compare_signals(baseline: &LlmSignals, current: &LlmSignals) -> DriftReport {
    let deltas: BTreeMap<String, f64> = LLM_METRIC_KEYS
        .iter()
        .map(|key| {
            let delta = metric(current, key) - metric(baseline, key);
            (key.to_string(), delta)
        })
        .collect();

    let mut findings: Vec<DriftFinding> = RATE_DRIFT_METRICS
        .iter()
        .filter_map(|(key, label)| rate_finding(baseline, current, key, label))
        .collect();
    findings.extend(variability_finding(baseline, current));

    findings.sort_by_key(|finding| finding.severity.rank());

    if let Some(top) = findings.first() {
        tracing::info!(
            findings = findings.len(),
            highest = %top.severity,
            "Drift detected against baseline"
        );
    }

    DriftReport {
        baseline: baseline.clone(),
        current: current.clone(),
        deltas,
        findings,
    }
}

fn rate_finding(
    baseline: &LlmSignals,
    current: &LlmSignals,
    key: &str,
    label: &str,
) -> Option<DriftFinding> {
    let before = metric(baseline, key);
    let after = metric(current, key);
    let delta = after - before;

    let (severity, explanation) = if delta > 0.0 {
        let severity = if delta >= HIGH_RATE_DELTA {
            DriftSeverity::High
        } else if delta >= MEDIUM_RATE_DELTA {
            DriftSeverity::Medium
        } else {
            DriftSeverity::Low
        };
        (severity, format!("{} increased by {:.3} (absolute)", label, delta))
    } else if delta < 0.0 {
        (
            DriftSeverity::Info,
            format!("{} improved by {:.3} (absolute decrease)", label, delta.abs()),
        )
    } else {
        return None;
    };

    Some(DriftFinding {
        severity,
        explanation,
        evidence: finding_evidence(key, json!(before), json!(after), json!(delta)),
    })
}

fn variability_finding(baseline: &LlmSignals, current: &LlmSignals) -> Option<DriftFinding> {
    let key = REPEATED_PROMPTS_WITH_LABEL_VARIABILITY;
    let before = baseline.metrics.count(key) as i64;
    let after = current.metrics.count(key) as i64;
    let delta = after - before;

    let (severity, explanation) = match delta {
        0 => return None,
        d if d > 0 => (
            DriftSeverity::High,
            format!("Repeated-prompt label variability increased by {}", d),
        ),
        d => (
            DriftSeverity::Info,
            format!("Repeated-prompt label variability improved by {}", d.abs()),
        ),
    };

    Some(DriftFinding {
        severity,
        explanation,
        evidence: finding_evidence(key, json!(before), json!(after), json!(delta)),
    })
}

fn finding_evidence(key: &str, before: Value, after: Value, delta: Value) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("metric".to_string(), json!(key)),
        ("baseline".to_string(), before),
        ("current".to_string(), after),
        ("delta".to_string(), delta),
    ])
}

fn find_signal<'a>(signals: &'a [AiSignal], title: &str) -> Result<&'a AiSignal> {
    signals
        .iter()
        .find(|signal| signal.title == title)
        .ok_or_else(|| AppError::Internal(format!("Missing expected signal: {}", title)))
}

fn metric(signals: &LlmSignals, key: &str) -> f64 {
    signals.metrics.get(key).map_or(0.0, |value| value.as_f64())
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
