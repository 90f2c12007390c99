use crate::domain::metrics::Metrics;
use crate::domain::transcript::AiSignal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    High,
    Medium,
    Low,
    Info,
}

impl DriftSeverity {
    /// Sort rank: high first, info last.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Info => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFinding {
    pub severity: DriftSeverity,
    pub explanation: String,
    /// Always carries `metric`, `baseline`, `current` and `delta`.
    pub evidence: BTreeMap<String, Value>,
}

/// Deterministic summary plus raw signals for one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSignals {
    /// Always includes every key of `LLM_METRIC_KEYS`, even when zero.
    pub metrics: Metrics,
    pub signals: Vec<AiSignal>,
    pub source_path: Option<String>,
    pub source_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub baseline: LlmSignals,
    pub current: LlmSignals,
    pub deltas: BTreeMap<String, f64>,
    /// Sorted high, medium, low, info; ties keep emission order.
    pub findings: Vec<DriftFinding>,
}

impl DriftReport {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn highest_severity(&self) -> Option<DriftSeverity> {
        self.findings.first().map(|f| f.severity)
    }
}
