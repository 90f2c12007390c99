use crate::application::use_cases::signal_extractors::count_by_type;
use crate::domain::metrics::TEST_METRIC_KEYS;
use crate::domain::readiness::{ReadinessReport, RiskLevel};
use crate::domain::signal::Signal;

/// Renders the deterministic readiness report.
pub fn build_markdown_report(report: &ReadinessReport) -> String {
    let score = report.score();
    let overall = score.overall_score().round() as i64;
    let risk = score.risk_level();

    let mut lines = vec![
        "# Release Readiness Report".to_string(),
        String::new(),
        format!("**Score:** {} / 100", overall),
        format!("**Risk Level:** {}", risk),
        format!("**Recommendation:** {}", score.recommendation()),
        String::new(),
        "## Executive Summary".to_string(),
        String::new(),
        executive_summary(overall, risk),
        String::new(),
        "## Metrics".to_string(),
        String::new(),
        "| Metric | Value |".to_string(),
        "|---|---:|".to_string(),
    ];

    let metrics = report.metrics();
    for key in TEST_METRIC_KEYS {
        if let Some(value) = metrics.get(key) {
            lines.push(format!("| `{}` | {} |", key, value));
        }
    }
    for (key, value) in metrics.iter() {
        if !TEST_METRIC_KEYS.iter().any(|known| *known == key) {
            lines.push(format!("| `{}` | {} |", key, value));
        }
    }
    lines.push(String::new());

    lines.push("## Risks".to_string());
    lines.push(String::new());
    if report.risks().is_empty() {
        lines.push("- No risks identified.".to_string());
    }
    for risk in report.risks() {
        lines.push(format!(
            "- **{}** {} ({})",
            risk.severity().as_str().to_uppercase(),
            risk.description(),
            risk.evidence().join(", ")
        ));
    }
    lines.push(String::new());

    lines.push("## Data Availability".to_string());
    lines.push(String::new());
    for (key, available) in report.data_availability() {
        lines.push(format!("- {}: {}", key, if *available { "yes" } else { "no" }));
    }
    lines.push(String::new());

    lines.push("## Assumptions".to_string());
    lines.push(String::new());
    for assumption in report.assumptions() {
        lines.push(format!("- {}", assumption));
    }
    lines.push(String::new());

    lines.join("\n")
}

fn executive_summary(score: i64, risk: RiskLevel) -> String {
    let outlook = match risk {
        RiskLevel::Low => "The current test results suggest a favorable release outlook.",
        RiskLevel::Medium => {
            "The current test results indicate moderate risk that warrants review before release."
        }
        RiskLevel::High => {
            "The current test results indicate elevated risk that requires attention before release."
        }
    };
    format!(
        "The release readiness score is {} out of 100, indicating a {} risk level. {}",
        score, risk, outlook
    )
}

/// Advisory section listing extractor output; never feeds the score.
pub fn build_signals_section(signals: &[Signal]) -> String {
    let mut lines = vec![
        "## Extracted Signals (advisory)".to_string(),
        String::new(),
    ];

    if signals.is_empty() {
        lines.push("- _No signals extracted._".to_string());
        lines.push(String::new());
        return lines.join("\n");
    }

    let counts = count_by_type(signals)
        .into_iter()
        .map(|(kind, count)| format!("{}: {}", kind, count))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("_Signals by type: {}_", counts));
    lines.push(String::new());
    lines.push("| Signal | Type | Value | Description |".to_string());
    lines.push("|---|---|---:|---|".to_string());
    for signal in signals {
        lines.push(format!(
            "| `{}` | {} | {:.1} | {} |",
            signal.name(),
            signal.signal_type(),
            signal.value(),
            signal.description()
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}
