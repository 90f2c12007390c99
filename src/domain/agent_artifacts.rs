use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Optional AI-agent artifacts supplied next to the test results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentArtifacts {
    #[serde(default)]
    pub conversations: Option<Vec<ConversationLog>>,
    #[serde(default)]
    pub intents: Option<Vec<IntentRecord>>,
    #[serde(default)]
    pub flows: Option<Vec<FlowTrace>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationLog {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub responses: Option<Vec<Value>>,
}

impl ConversationLog {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed") || self.completed == Some(true)
    }
}

/// `predicted` and `actual` distinguish an absent key (`None`) from an
/// explicit `null` (`Some(None)`): ground truth counts as recorded whenever
/// both keys are present, even if one of them is null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl IntentRecord {
    pub fn new(predicted: Option<&str>, actual: Option<&str>) -> Self {
        Self {
            predicted: predicted.map(|p| Some(p.to_string())),
            actual: actual.map(|a| Some(a.to_string())),
            kind: None,
        }
    }

    pub fn predicted(&self) -> Option<&str> {
        self.predicted.as_ref().and_then(|p| p.as_deref())
    }

    pub fn actual(&self) -> Option<&str> {
        self.actual.as_ref().and_then(|a| a.as_deref())
    }

    /// Both keys were supplied, whatever their values.
    pub fn has_ground_truth(&self) -> bool {
        self.predicted.is_some() && self.actual.is_some()
    }

    /// Label used for distribution analysis: predicted, then type, then "unknown".
    pub fn label(&self) -> &str {
        self.predicted()
            .filter(|p| !p.is_empty())
            .or(self.kind.as_deref())
            .unwrap_or("unknown")
    }
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTrace {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub reached_end: Option<bool>,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
}

impl FlowTrace {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
            || self.completed == Some(true)
            || self.reached_end == Some(true)
    }
}
