use super::super::generic::percent;
use crate::domain::agent_artifacts::ConversationLog;
use crate::domain::error::Result;
use crate::domain::signal::{metadata, Signal};
use serde_json::{json, Value};

/// Completion rate, plus response-length consistency when every
/// conversation carries its responses.
pub fn analyze(conversations: Option<&[ConversationLog]>) -> Result<Vec<Signal>> {
    let Some(conversations) = conversations.filter(|c| !c.is_empty()) else {
        return Ok(Vec::new());
    };

    let total = conversations.len();
    let completed = conversations.iter().filter(|c| c.is_completed()).count();
    let completion_rate = completed as f64 / total as f64;

    let mut signals = vec![Signal::stability(
        "conversation_completion_rate",
        completion_rate * 100.0,
        format!("Conversation completion rate: {}/{}", completed, total),
        vec![
            format!("Completed conversations: {}", completed),
            format!("Total conversations: {}", total),
            format!("Completion rate: {}", percent(completion_rate)),
        ],
        metadata([
            ("completion_rate", json!(completion_rate)),
            ("total", json!(total)),
        ]),
    )?];

    if conversations.iter().all(|c| c.responses.is_some()) {
        let lengths: Vec<f64> = conversations
            .iter()
            .flat_map(|c| c.responses.iter().flatten())
            .map(|r| response_length(r) as f64)
            .collect();

        if !lengths.is_empty() {
            let avg_length = lengths.iter().sum::<f64>() / lengths.len() as f64;
            let variance = lengths
                .iter()
                .map(|l| (l - avg_length).powi(2))
                .sum::<f64>()
                / lengths.len() as f64;
            let cv = if avg_length > 0.0 {
                variance.sqrt() / avg_length
            } else {
                0.0
            };
            let consistency = (1.0 - cv.min(1.0)).max(0.0);

            signals.push(Signal::stability(
                "response_consistency",
                consistency * 100.0,
                "Consistency of response patterns across conversations",
                vec![
                    format!("Average response length: {:.1}", avg_length),
                    format!("Response consistency: {}", percent(consistency)),
                ],
                metadata([
                    ("consistency", json!(consistency)),
                    ("avg_length", json!(avg_length)),
                ]),
            )?);
        }
    }

    Ok(signals)
}

// Strings count their characters; anything else counts its JSON text.
fn response_length(response: &Value) -> usize {
    match response {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}
