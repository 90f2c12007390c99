use crate::domain::error::{AppError, Result};
use crate::domain::transcript::{Transcript, TranscriptTurn};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads a transcript file and records its path and SHA-256 digest.
pub fn load_transcript(path: impl AsRef<Path>) -> Result<Transcript> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("Transcript not found: {}", path.display()))
        }
        _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
    })?;

    let mut transcript = parse_transcript(&bytes)?;
    transcript.source_path = Some(path.display().to_string());
    transcript.source_digest = Some(hex::encode(Sha256::digest(&bytes)));

    tracing::info!(
        path = %path.display(),
        turns = transcript.turns.len(),
        "Transcript loaded"
    );
    Ok(transcript)
}

/// The root must be an object with a `turns` array. Malformed turns are
/// kept as empty turns so turn counts stay faithful to the file.
pub fn parse_transcript(bytes: &[u8]) -> Result<Transcript> {
    let raw: Value = serde_json::from_slice(bytes)?;
    let Value::Object(root) = raw else {
        return Err(AppError::ParseError(
            "Transcript JSON must be an object".to_string(),
        ));
    };
    let Some(Value::Array(items)) = root.get("turns") else {
        return Err(AppError::ParseError(
            "Transcript JSON must contain 'turns' as a list".to_string(),
        ));
    };

    let turns = items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => turn_from_object(fields),
            _ => {
                tracing::warn!(turn = index, "Transcript turn is not an object");
                TranscriptTurn::default()
            }
        })
        .collect();

    Ok(Transcript::new(turns))
}

fn turn_from_object(fields: &Map<String, Value>) -> TranscriptTurn {
    TranscriptTurn {
        user_text: text_field(fields, "user_text"),
        assistant_text: text_field(fields, "assistant_text"),
        assistant_label: text_field(fields, "assistant_label"),
        expected_schema_valid: fields.get("expected_schema_valid").and_then(Value::as_bool),
        refusal: fields.get("refusal").and_then(Value::as_bool),
        tool_calls: fields
            .get("tool_calls")
            .and_then(Value::as_array)
            .cloned(),
    }
}

// Scalars become their text; arrays and objects their compact JSON.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
