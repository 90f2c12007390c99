//! Schema-light metrics bag shared by the metrics engine, the classifier and
//! the LLM transcript summaries.
//!
//! Consumers read the keys they need and treat absent keys as zero, so
//! extractors may add their own keys without touching a fixed record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const TOTAL_CASES: &str = "total_cases";
pub const TOTAL_RESULTS: &str = "total_results";
pub const MAPPED_RESULTS: &str = "mapped_results";
pub const UNMAPPED_RESULTS: &str = "unmapped_results";
pub const PASSED: &str = "passed";
pub const FAILED: &str = "failed";
pub const SKIPPED: &str = "skipped";
pub const FAILURE_RATE: &str = "failure_rate";
pub const SKIP_RATE: &str = "skip_rate";

/// Keys produced by the metrics engine, in report order.
pub const TEST_METRIC_KEYS: [&str; 9] = [
    TOTAL_CASES,
    TOTAL_RESULTS,
    MAPPED_RESULTS,
    UNMAPPED_RESULTS,
    PASSED,
    FAILED,
    SKIPPED,
    FAILURE_RATE,
    SKIP_RATE,
];

pub const TURNS_TOTAL: &str = "turns_total";
pub const ERROR_TURNS: &str = "error_turns";
pub const ERROR_RATE: &str = "error_rate";
pub const REFUSAL_TURNS: &str = "refusal_turns";
pub const REFUSAL_RATE: &str = "refusal_rate";
pub const TOOL_CALLS_TOTAL: &str = "tool_calls_total";
pub const TOOL_CALLS_ERROR: &str = "tool_calls_error";
pub const TOOL_ERROR_RATE: &str = "tool_error_rate";
pub const REPEATED_PROMPTS_WITH_LABEL_VARIABILITY: &str =
    "repeated_prompts_with_label_variability";

/// The nine keys every transcript summary carries, in drift-table order.
pub const LLM_METRIC_KEYS: [&str; 9] = [
    TURNS_TOTAL,
    ERROR_TURNS,
    ERROR_RATE,
    REFUSAL_TURNS,
    REFUSAL_RATE,
    TOOL_CALLS_TOTAL,
    TOOL_CALLS_ERROR,
    TOOL_ERROR_RATE,
    REPEATED_PROMPTS_WITH_LABEL_VARIABILITY,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Rate(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Count(value) => *value as f64,
            Self::Rate(value) => *value,
        }
    }

    pub fn as_count(&self) -> u64 {
        match self {
            Self::Count(value) => *value,
            Self::Rate(value) if value.is_finite() && *value > 0.0 => value.trunc() as u64,
            Self::Rate(_) => 0,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(value) => write!(f, "{}", value),
            Self::Rate(value) => write!(f, "{:.3}", value),
        }
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        Self::Count(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        Self::Count(value as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Rate(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.0.get(key).copied()
    }

    /// Reads a numeric value, treating absent keys as zero.
    pub fn rate(&self, key: &str) -> f64 {
        self.get(key).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// Reads an integer value, treating absent keys as zero.
    pub fn count(&self, key: &str) -> u64 {
        self.get(key).map(|v| v.as_count()).unwrap_or(0)
    }

    /// `unmapped_results / total_results`, or 0.0 without results.
    pub fn unmapped_rate(&self) -> f64 {
        let total = self.count(TOTAL_RESULTS);
        if total == 0 {
            return 0.0;
        }
        self.count(UNMAPPED_RESULTS) as f64 / total as f64
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_keys_read_as_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.rate(FAILURE_RATE), 0.0);
        assert_eq!(metrics.count(FAILED), 0);
        assert_eq!(metrics.unmapped_rate(), 0.0);
    }

    #[test]
    fn test_unmapped_rate_uses_total_results() {
        let metrics = Metrics::new()
            .with(TOTAL_RESULTS, 4usize)
            .with(UNMAPPED_RESULTS, 1usize);
        assert_eq!(metrics.unmapped_rate(), 0.25);
    }

    #[test]
    fn test_serializes_as_flat_number_map() {
        let metrics = Metrics::new()
            .with(FAILED, 2usize)
            .with(FAILURE_RATE, 0.5);
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["failed"], 2);
        assert_eq!(json["failure_rate"], 0.5);
    }
}
