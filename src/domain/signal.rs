use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Categories of signals considered by the readiness engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Stability,
    Regression,
    Coverage,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stability => write!(f, "stability"),
            Self::Regression => write!(f, "regression"),
            Self::Coverage => write!(f, "coverage"),
        }
    }
}

/// A named, evidenced observation on a 0-100 scale (higher = healthier).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    signal_type: SignalType,
    name: String,
    value: f64,
    description: String,
    evidence: Vec<String>,
    metadata: BTreeMap<String, Value>,
}

impl Signal {
    pub fn new(
        signal_type: SignalType,
        name: impl Into<String>,
        value: f64,
        description: impl Into<String>,
        evidence: Vec<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let name = name.into();
        let description = description.into();
        if name.is_empty() {
            return Err(AppError::ValidationError("name cannot be empty".to_string()));
        }
        if description.is_empty() {
            return Err(AppError::ValidationError(
                "description cannot be empty".to_string(),
            ));
        }
        if evidence.is_empty() {
            return Err(AppError::ValidationError(format!(
                "evidence cannot be empty (signal={})",
                name
            )));
        }
        Ok(Self {
            signal_type,
            name,
            value,
            description,
            evidence,
            metadata,
        })
    }

    pub fn stability(
        name: impl Into<String>,
        value: f64,
        description: impl Into<String>,
        evidence: Vec<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Result<Self> {
        Self::new(
            SignalType::Stability,
            name,
            value,
            description,
            evidence,
            metadata,
        )
    }

    pub fn regression(
        name: impl Into<String>,
        value: f64,
        description: impl Into<String>,
        evidence: Vec<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Result<Self> {
        Self::new(
            SignalType::Regression,
            name,
            value,
            description,
            evidence,
            metadata,
        )
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }
}

/// Builds a metadata map from `(key, value)` pairs.
pub fn metadata<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signal_rejects_empty_fields() {
        let empty_name = Signal::stability("", 50.0, "desc", vec!["e".into()], BTreeMap::new());
        assert!(empty_name.is_err());

        let empty_desc = Signal::stability("name", 50.0, "", vec!["e".into()], BTreeMap::new());
        assert!(empty_desc.is_err());

        let empty_evidence = Signal::regression("name", 50.0, "desc", vec![], BTreeMap::new());
        assert!(matches!(empty_evidence, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_variant_constructors_fix_type() {
        let signal = Signal::regression(
            "new_failures",
            100.0,
            "New failures detected: 0 test(s)",
            vec!["New failures: 0".to_string()],
            metadata([("total_tests", json!(3))]),
        )
        .unwrap();
        assert_eq!(signal.signal_type(), SignalType::Regression);
        assert_eq!(signal.metadata()["total_tests"], json!(3));
    }
}
