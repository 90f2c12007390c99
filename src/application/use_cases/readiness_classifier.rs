use crate::domain::error::Result;
use crate::domain::metrics::{
    Metrics, FAILED, FAILURE_RATE, SKIPPED, SKIP_RATE, TOTAL_CASES, TOTAL_RESULTS,
    UNMAPPED_RESULTS,
};
use crate::domain::readiness::{
    BehavioralRisk, ReadinessReport, ReadinessScore, ReleaseRecommendation, RiskLevel,
};
use std::collections::BTreeMap;

const FAILURE_PENALTY_CAP: i64 = 70;
const SKIP_PENALTY_CAP: i64 = 20;
const UNMAPPED_PENALTY_CAP: i64 = 20;

const HIGH_FAILURE_RATE: f64 = 0.20;
const HIGH_UNMAPPED_RATE: f64 = 0.30;
const ESCALATION_SKIP_RATE: f64 = 0.10;
const ESCALATION_UNMAPPED_RATE: f64 = 0.05;
const LOW_RISK_MIN_SCORE: i64 = 85;
const MEDIUM_RISK_MIN_SCORE: i64 = 70;

const SEVERE_FAILURE_RATE: f64 = 0.10;
const SEVERE_SKIP_RATE: f64 = 0.20;

pub const CURRENT_RUN_ASSUMPTION: &str = "Score/risk computed deterministically from current-run test metrics only (no LLM judging, no trend/history inputs).";

/// Explainable penalty model, clamped to `[0, 100]`:
///
/// - failure rate: 1 point per 1% (capped at 70)
/// - skip rate: 0.5 points per 1% (capped at 20)
/// - unmapped rate: 0.5 points per 1% of all results (capped at 20)
pub fn compute_release_readiness_score(metrics: &Metrics) -> i64 {
    let failure_penalty = penalty(metrics.rate(FAILURE_RATE) * 100.0, FAILURE_PENALTY_CAP);
    let skip_penalty = penalty(metrics.rate(SKIP_RATE) * 50.0, SKIP_PENALTY_CAP);
    let unmapped_penalty = penalty(metrics.unmapped_rate() * 50.0, UNMAPPED_PENALTY_CAP);

    (100 - failure_penalty - skip_penalty - unmapped_penalty).clamp(0, 100)
}

// Half-to-even rounding keeps 12.5 -> 12, matching the published scores.
fn penalty(raw: f64, cap: i64) -> i64 {
    if !raw.is_finite() {
        return if raw > 0.0 { cap } else { 0 };
    }
    let rounded = raw.round_ties_even();
    if rounded >= cap as f64 {
        cap
    } else {
        rounded as i64
    }
}

/// Escalations are checked before the plain score thresholds.
pub fn classify_risk(score: i64, metrics: &Metrics) -> RiskLevel {
    let failure_rate = metrics.rate(FAILURE_RATE);
    let skip_rate = metrics.rate(SKIP_RATE);
    let unmapped_rate = metrics.unmapped_rate();

    if failure_rate >= HIGH_FAILURE_RATE || unmapped_rate >= HIGH_UNMAPPED_RATE {
        return RiskLevel::High;
    }

    if score >= LOW_RISK_MIN_SCORE
        && (skip_rate > ESCALATION_SKIP_RATE || unmapped_rate > ESCALATION_UNMAPPED_RATE)
    {
        return RiskLevel::Medium;
    }

    if score >= LOW_RISK_MIN_SCORE {
        RiskLevel::Low
    } else if score >= MEDIUM_RISK_MIN_SCORE {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn build_readiness_report(metrics: &Metrics) -> Result<ReadinessReport> {
    let score = compute_release_readiness_score(metrics);
    let risk_level = classify_risk(score, metrics);
    let recommendation = ReleaseRecommendation::from(risk_level);

    let score_value = score as f64;
    let readiness_score = ReadinessScore::new(
        score_value,
        score_value,
        score_value,
        score_value,
        risk_level,
        recommendation,
    )?;

    let failed = metrics.count(FAILED);
    let skipped = metrics.count(SKIPPED);
    let unmapped = metrics.count(UNMAPPED_RESULTS);
    let total_results = metrics.count(TOTAL_RESULTS);
    let failure_rate = metrics.rate(FAILURE_RATE);
    let skip_rate = metrics.rate(SKIP_RATE);

    let mut risks = Vec::new();
    if failed > 0 {
        let severity = if failure_rate >= SEVERE_FAILURE_RATE {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
        risks.push(BehavioralRisk::new(
            "Test failures detected in mapped results",
            severity,
            vec![
                format!("failed={}", failed),
                format!("failure_rate={:.3}", failure_rate),
            ],
            None,
        )?);
    }
    if skip_rate > SEVERE_SKIP_RATE || skipped > 0 {
        let severity = if skip_rate > SEVERE_SKIP_RATE {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
        risks.push(BehavioralRisk::new(
            "Skipped tests reduce confidence in coverage",
            severity,
            vec![
                format!("skipped={}", skipped),
                format!("skip_rate={:.3}", skip_rate),
            ],
            None,
        )?);
    }
    if unmapped > 0 {
        risks.push(BehavioralRisk::new(
            "Unmapped results indicate traceability gaps",
            RiskLevel::Medium,
            vec![
                format!("unmapped_results={}", unmapped),
                format!("total_results={}", total_results),
            ],
            None,
        )?);
    }

    let data_availability = BTreeMap::from([
        ("metrics".to_string(), true),
        ("test_results_present".to_string(), total_results > 0),
        (
            "test_cases_present".to_string(),
            metrics.count(TOTAL_CASES) > 0,
        ),
    ]);

    let signal_summary = BTreeMap::from([
        ("failed".to_string(), failed),
        ("skipped".to_string(), skipped),
        ("unmapped_results".to_string(), unmapped),
    ]);

    tracing::info!(
        score,
        risk = %risk_level,
        recommendation = %recommendation,
        risks = risks.len(),
        "Readiness report built"
    );

    ReadinessReport::new(
        readiness_score,
        risks,
        data_availability,
        vec![CURRENT_RUN_ASSUMPTION.to_string()],
        signal_summary,
        metrics.clone(),
    )
}
