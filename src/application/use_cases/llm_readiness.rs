//! Transcript-level readiness signals: schema/format errors, refusals, tool
//! errors, and label variability for repeated prompts.

use crate::domain::transcript::{AiSeverity, AiSignal, Transcript};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const SCHEMA_ERRORS_TITLE: &str = "Schema/format errors in assistant output";
pub const REFUSAL_RATE_TITLE: &str = "Refusal rate";
pub const TOOL_ERROR_RATE_TITLE: &str = "Tool error rate";
pub const VARIABILITY_TITLE: &str =
    "Response variability proxy (label changes for repeated prompts)";

const MAX_VARIABILITY_EXAMPLES: usize = 3;

/// A turn is an error turn when its schema flag is false or absent, or when
/// the assistant text is absent or blank.
pub fn extract_schema_format_errors(transcript: &Transcript) -> AiSignal {
    let mut error_turns = 0u64;
    let mut explicit_invalid = 0u64;
    let mut missing_flag = 0u64;
    let mut missing_text = 0u64;

    for turn in &transcript.turns {
        let invalid = turn.expected_schema_valid == Some(false);
        let flag_missing = turn.expected_schema_valid.is_none();
        let text_missing = turn
            .assistant_text
            .as_deref()
            .map_or(true, |text| text.trim().is_empty());

        explicit_invalid += u64::from(invalid);
        missing_flag += u64::from(flag_missing);
        missing_text += u64::from(text_missing);
        if invalid || flag_missing || text_missing {
            error_turns += 1;
        }
    }

    let severity = match error_turns {
        n if n >= 3 => AiSeverity::High,
        n if n >= 1 => AiSeverity::Medium,
        _ => AiSeverity::Low,
    };

    AiSignal {
        severity,
        title: SCHEMA_ERRORS_TITLE.to_string(),
        evidence: evidence([
            ("turns_total", json!(transcript.turns.len())),
            ("error_turns", json!(error_turns)),
            ("explicit_invalid", json!(explicit_invalid)),
            ("missing_expected_schema_valid", json!(missing_flag)),
            ("missing_assistant_text", json!(missing_text)),
        ]),
    }
}

pub fn extract_refusal_rate(transcript: &Transcript) -> AiSignal {
    let total = transcript.turns.len();
    let refusals = transcript
        .turns
        .iter()
        .filter(|turn| turn.refusal == Some(true))
        .count();
    let rate = ratio(refusals, total);

    let severity = if rate >= 0.3 {
        AiSeverity::High
    } else if rate > 0.0 {
        AiSeverity::Medium
    } else {
        AiSeverity::Low
    };

    AiSignal {
        severity,
        title: REFUSAL_RATE_TITLE.to_string(),
        evidence: evidence([
            ("turns_total", json!(total)),
            ("refusal_turns", json!(refusals)),
            ("refusal_rate", json!(rate)),
        ]),
    }
}

/// Only object-shaped tool calls count; a call errored when its `status`
/// is exactly `"error"`.
pub fn extract_tool_error_rate(transcript: &Transcript) -> AiSignal {
    let calls: Vec<&Map<String, Value>> = transcript
        .turns
        .iter()
        .flat_map(|turn| turn.tool_calls.iter().flatten())
        .filter_map(Value::as_object)
        .collect();
    let errors = calls
        .iter()
        .filter(|call| call.get("status").and_then(Value::as_str) == Some("error"))
        .count();
    let rate = ratio(errors, calls.len());

    let severity = if rate >= 0.2 {
        AiSeverity::High
    } else if rate > 0.0 {
        AiSeverity::Medium
    } else {
        AiSeverity::Low
    };

    AiSignal {
        severity,
        title: TOOL_ERROR_RATE_TITLE.to_string(),
        evidence: evidence([
            ("tool_calls_total", json!(calls.len())),
            ("tool_calls_error", json!(errors)),
            ("tool_error_rate", json!(rate)),
        ]),
    }
}

/// Counts prompts (identical user text) answered with more than one
/// distinct assistant label. Turns lacking either field are ignored.
pub fn extract_response_variability_proxy(transcript: &Transcript) -> AiSignal {
    // Prompts in first-seen order so the examples are stable.
    let mut prompts: Vec<(&str, BTreeSet<&str>)> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for turn in &transcript.turns {
        let (Some(user_text), Some(label)) =
            (turn.user_text.as_deref(), turn.assistant_label.as_deref())
        else {
            continue;
        };
        match index.get(user_text) {
            Some(&slot) => {
                prompts[slot].1.insert(label);
            }
            None => {
                index.insert(user_text, prompts.len());
                prompts.push((user_text, BTreeSet::from([label])));
            }
        }
    }

    let variable: Vec<&(&str, BTreeSet<&str>)> =
        prompts.iter().filter(|(_, labels)| labels.len() > 1).collect();
    let examples: Map<String, Value> = variable
        .iter()
        .take(MAX_VARIABILITY_EXAMPLES)
        .map(|(prompt, labels)| (prompt.to_string(), json!(labels)))
        .collect();

    let severity = match variable.len() {
        n if n >= 2 => AiSeverity::High,
        1 => AiSeverity::Medium,
        _ => AiSeverity::Low,
    };

    AiSignal {
        severity,
        title: VARIABILITY_TITLE.to_string(),
        evidence: evidence([
            ("repeated_prompts_with_label_variability", json!(variable.len())),
            ("examples", Value::Object(examples)),
        ]),
    }
}

/// The four transcript signals in fixed order.
pub fn extract_all_signals(transcript: &Transcript) -> Vec<AiSignal> {
    vec![
        extract_schema_format_errors(transcript),
        extract_refusal_rate(transcript),
        extract_tool_error_rate(transcript),
        extract_response_variability_proxy(transcript),
    ]
}

fn evidence<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
