use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A single user/assistant exchange.
///
/// Every field is optional: missing or malformed data is counted by the
/// readiness extractors rather than rejected at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub user_text: Option<String>,
    pub assistant_text: Option<String>,
    pub assistant_label: Option<String>,
    pub expected_schema_valid: Option<bool>,
    pub refusal: Option<bool>,
    /// Raw tool-call records; only object entries are counted.
    pub tool_calls: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub turns: Vec<TranscriptTurn>,
    pub source_path: Option<String>,
    /// SHA-256 of the source bytes, when loaded from a file.
    pub source_digest: Option<String>,
}

impl Transcript {
    pub fn new(turns: Vec<TranscriptTurn>) -> Self {
        Self {
            turns,
            source_path: None,
            source_digest: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for AiSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// One transcript-level readiness signal with its evidence bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSignal {
    pub severity: AiSeverity,
    pub title: String,
    pub evidence: BTreeMap<String, Value>,
}

impl AiSignal {
    pub fn evidence_count(&self, key: &str) -> u64 {
        self.evidence
            .get(key)
            .and_then(|value| {
                value
                    .as_u64()
                    .or_else(|| value.as_f64().map(|f| f.max(0.0).trunc() as u64))
            })
            .unwrap_or(0)
    }
}
