use crate::domain::error::{AppError, Result};
use crate::domain::metrics::Metrics;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseRecommendation {
    Approve,
    Conditional,
    Reject,
}

impl ReleaseRecommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Conditional => "conditional",
            Self::Reject => "reject",
        }
    }
}

impl From<RiskLevel> for ReleaseRecommendation {
    fn from(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Low => Self::Approve,
            RiskLevel::Medium => Self::Conditional,
            RiskLevel::High => Self::Reject,
        }
    }
}

impl fmt::Display for ReleaseRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness score with breakdown. Every score lies in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessScore {
    overall_score: f64,
    stability_score: f64,
    regression_score: f64,
    coverage_score: f64,
    risk_level: RiskLevel,
    recommendation: ReleaseRecommendation,
}

impl ReadinessScore {
    pub fn new(
        overall_score: f64,
        stability_score: f64,
        regression_score: f64,
        coverage_score: f64,
        risk_level: RiskLevel,
        recommendation: ReleaseRecommendation,
    ) -> Result<Self> {
        for (field, value) in [
            ("overall_score", overall_score),
            ("stability_score", stability_score),
            ("regression_score", regression_score),
            ("coverage_score", coverage_score),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(AppError::ValidationError(format!(
                    "{} must be between 0 and 100 (got {})",
                    field, value
                )));
            }
        }
        Ok(Self {
            overall_score,
            stability_score,
            regression_score,
            coverage_score,
            risk_level,
            recommendation,
        })
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn stability_score(&self) -> f64 {
        self.stability_score
    }

    pub fn regression_score(&self) -> f64 {
        self.regression_score
    }

    pub fn coverage_score(&self) -> f64 {
        self.coverage_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn recommendation(&self) -> ReleaseRecommendation {
        self.recommendation
    }
}

/// A behavioral risk identified during assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehavioralRisk {
    description: String,
    severity: RiskLevel,
    evidence: Vec<String>,
    affected_tests: Option<Vec<String>>,
}

impl BehavioralRisk {
    pub fn new(
        description: impl Into<String>,
        severity: RiskLevel,
        evidence: Vec<String>,
        affected_tests: Option<Vec<String>>,
    ) -> Result<Self> {
        let description = description.into();
        if description.is_empty() {
            return Err(AppError::ValidationError(
                "description cannot be empty".to_string(),
            ));
        }
        if evidence.is_empty() {
            return Err(AppError::ValidationError(
                "evidence cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            description,
            severity,
            evidence,
            affected_tests,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn severity(&self) -> RiskLevel {
        self.severity
    }

    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }

    pub fn affected_tests(&self) -> Option<&[String]> {
        self.affected_tests.as_deref()
    }
}

/// Complete readiness assessment. Always states at least one assumption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessReport {
    score: ReadinessScore,
    risks: Vec<BehavioralRisk>,
    data_availability: BTreeMap<String, bool>,
    assumptions: Vec<String>,
    signal_summary: BTreeMap<String, u64>,
    metrics: Metrics,
}

impl ReadinessReport {
    pub fn new(
        score: ReadinessScore,
        risks: Vec<BehavioralRisk>,
        data_availability: BTreeMap<String, bool>,
        assumptions: Vec<String>,
        signal_summary: BTreeMap<String, u64>,
        metrics: Metrics,
    ) -> Result<Self> {
        if assumptions.is_empty() {
            return Err(AppError::ValidationError(
                "assumptions cannot be empty - must state data availability".to_string(),
            ));
        }
        Ok(Self {
            score,
            risks,
            data_availability,
            assumptions,
            signal_summary,
            metrics,
        })
    }

    pub fn score(&self) -> &ReadinessScore {
        &self.score
    }

    pub fn risks(&self) -> &[BehavioralRisk] {
        &self.risks
    }

    pub fn data_availability(&self) -> &BTreeMap<String, bool> {
        &self.data_availability
    }

    pub fn assumptions(&self) -> &[String] {
        &self.assumptions
    }

    pub fn signal_summary(&self) -> &BTreeMap<String, u64> {
        &self.signal_summary
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: f64) -> Result<ReadinessScore> {
        ReadinessScore::new(
            value,
            value,
            value,
            value,
            RiskLevel::Low,
            ReleaseRecommendation::Approve,
        )
    }

    #[test]
    fn test_score_range_is_enforced() {
        assert!(score(0.0).is_ok());
        assert!(score(100.0).is_ok());
        assert!(score(100.5).is_err());
        assert!(score(-1.0).is_err());
        assert!(score(f64::NAN).is_err());
    }

    #[test]
    fn test_recommendation_follows_risk() {
        assert_eq!(
            ReleaseRecommendation::from(RiskLevel::Low),
            ReleaseRecommendation::Approve
        );
        assert_eq!(
            ReleaseRecommendation::from(RiskLevel::Medium),
            ReleaseRecommendation::Conditional
        );
        assert_eq!(
            ReleaseRecommendation::from(RiskLevel::High),
            ReleaseRecommendation::Reject
        );
    }

    #[test]
    fn test_risk_requires_description_and_evidence() {
        assert!(BehavioralRisk::new("", RiskLevel::High, vec!["x".into()], None).is_err());
        assert!(BehavioralRisk::new("Failures", RiskLevel::High, vec![], None).is_err());
    }

    #[test]
    fn test_report_requires_assumptions() {
        let result = ReadinessReport::new(
            score(90.0).unwrap(),
            vec![],
            BTreeMap::new(),
            vec![],
            BTreeMap::new(),
            Metrics::new(),
        );
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
