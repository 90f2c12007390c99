use crate::application::use_cases::drift_analyzer::{analyze_transcript, compare_signals};
use crate::application::use_cases::metrics_engine::compute_metrics;
use crate::application::use_cases::readiness_classifier::build_readiness_report;
use crate::application::use_cases::signal_extractors::SignalOrchestrator;
use crate::domain::error::Result;
use crate::domain::readiness::ReadinessReport;
use crate::domain::test_case::{NormalizedData, TestCase, TestResult, TestStatus};
use crate::domain::test_run::TestHistory;
use crate::infrastructure::artifacts::{load_artifacts, load_history};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::{read_test_cases, read_test_results, CsvParser};
use crate::infrastructure::normalizer::Normalizer;
use crate::infrastructure::reporting::{
    build_markdown_report, build_signals_section, build_stability_section, save_markdown_report,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

const CURRENT_RUN_ID: &str = "current";

#[derive(Debug, Clone, PartialEq)]
pub enum ReportInput {
    Demo,
    Files { cases: PathBuf, results: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub input: ReportInput,
    pub history: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub baseline_transcript: Option<PathBuf>,
    pub out: PathBuf,
}

impl ReportRequest {
    pub fn demo(out: impl Into<PathBuf>) -> Self {
        Self {
            input: ReportInput::Demo,
            history: None,
            artifacts: None,
            transcript: None,
            baseline_transcript: None,
            out: out.into(),
        }
    }
}

/// The rendered report plus the core result it was built from.
#[derive(Debug)]
pub struct RenderedReport {
    pub report: ReadinessReport,
    pub markdown: String,
}

/// Inputs -> metrics -> readiness report -> markdown, with optional
/// advisory sections that never touch the score.
pub struct ReadinessPipelineUseCase {
    config: AppConfig,
}

impl ReadinessPipelineUseCase {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, request: &ReportRequest) -> Result<PathBuf> {
        let rendered = self.render(request)?;
        save_markdown_report(&request.out, &rendered.markdown)?;
        Ok(request.out.clone())
    }

    pub fn render(&self, request: &ReportRequest) -> Result<RenderedReport> {
        let data = self.load_data(&request.input)?;
        let metrics = compute_metrics(&data);
        let report = build_readiness_report(&metrics)?;
        let mut markdown = build_markdown_report(&report);

        if request.history.is_some() || request.artifacts.is_some() {
            let history = match &request.history {
                Some(path) => Some(load_history(path)?),
                None => TestHistory::from_normalized(&data, CURRENT_RUN_ID)?,
            };
            let artifacts = request.artifacts.as_deref().map(load_artifacts).transpose()?;

            match history {
                Some(history) => {
                    let signals =
                        SignalOrchestrator::default().extract_all(&history, artifacts.as_ref())?;
                    append_section(&mut markdown, &build_signals_section(&signals));
                }
                None => tracing::warn!("No test results to derive signals from, skipping"),
            }
        }

        if let Some(transcript) = &request.transcript {
            let current = analyze_transcript(transcript)?;
            let drift = request
                .baseline_transcript
                .as_ref()
                .map(|baseline| analyze_transcript(baseline).map(|b| compare_signals(&b, &current)))
                .transpose()?;
            append_section(&mut markdown, &build_stability_section(&current, drift.as_ref()));
        }

        Ok(RenderedReport { report, markdown })
    }

    pub fn load_data(&self, input: &ReportInput) -> Result<NormalizedData> {
        match input {
            ReportInput::Demo => Ok(build_demo_data()),
            ReportInput::Files { cases, results } => {
                let parser = CsvParser::new()
                    .with_delimiter(self.config.csv.delimiter_byte()?)
                    .with_trim(self.config.csv.trim);
                let raw_cases = read_test_cases(cases, &parser)?;
                let raw_results = read_test_results(results, &parser)?;
                Normalizer::from_config(&self.config.normalizer)?.normalize(raw_cases, raw_results)
            }
        }
    }
}

fn append_section(markdown: &mut String, section: &str) {
    if !markdown.ends_with('\n') {
        markdown.push('\n');
    }
    markdown.push('\n');
    markdown.push_str(section);
}

/// Three cases and four results, one of which references an unknown case.
pub fn build_demo_data() -> NormalizedData {
    let case = |id: &str, title: &str, priority: &str, component: &str, description: &str| {
        (
            id.to_string(),
            TestCase {
                id: id.to_string(),
                title: title.to_string(),
                priority: Some(priority.to_string()),
                component: Some(component.to_string()),
                description: Some(description.to_string()),
            },
        )
    };
    let result = |id: &str, status: TestStatus, duration_sec: f64, raw_name: &str| TestResult {
        id: id.to_string(),
        status,
        duration_sec: Some(duration_sec),
        raw_name: Some(raw_name.to_string()),
    };

    let test_cases: BTreeMap<String, TestCase> = [
        case(
            "TC-001",
            "Login works",
            "high",
            "auth",
            "Basic login should succeed with valid credentials.",
        ),
        case(
            "TC-002",
            "Checkout works",
            "high",
            "payments",
            "Checkout should succeed for an in-stock item with valid payment method.",
        ),
        case(
            "TC-003",
            "Refund intent supported",
            "medium",
            "support",
            "User asks for refund; system should route to correct policy/flow.",
        ),
    ]
    .into_iter()
    .collect();

    let results = vec![
        result("TC-001", TestStatus::Passed, 1.23, "test_login_ok"),
        result("TC-002", TestStatus::Failed, 4.50, "test_checkout_ok"),
        result("TC-003", TestStatus::Skipped, 0.0, "test_refund_intent"),
        result("TC-999", TestStatus::Failed, 0.50, "test_unknown"),
    ];

    NormalizedData::new(test_cases, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{FAILURE_RATE, UNMAPPED_RESULTS};
    use crate::domain::readiness::{ReleaseRecommendation, RiskLevel};
    use std::path::Path;

    fn pipeline() -> ReadinessPipelineUseCase {
        ReadinessPipelineUseCase::new(AppConfig::default())
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_demo_report_is_scenario_a() {
        let rendered = pipeline().render(&ReportRequest::demo("unused.md")).unwrap();
        let score = rendered.report.score();
        assert_eq!(score.overall_score(), 38.0);
        assert_eq!(score.risk_level(), RiskLevel::High);
        assert_eq!(score.recommendation(), ReleaseRecommendation::Reject);
        assert_eq!(rendered.report.metrics().count(UNMAPPED_RESULTS), 1);
        assert!(!rendered.markdown.contains("Extracted Signals"));
    }

    #[test]
    fn test_execute_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports/report.md");
        let saved = pipeline().execute(&ReportRequest::demo(&out)).unwrap();
        assert_eq!(saved, out);
        let content = std::fs::read_to_string(out).unwrap();
        assert!(content.contains("# Release Readiness Report"));
    }

    #[test]
    fn test_file_inputs_match_demo_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cases = write(
            dir.path(),
            "cases.csv",
            "id,title,priority,component\nTC-001,Login works,high,auth\nTC-002,Checkout works,high,payments\nTC-003,Refund intent supported,medium,support\n",
        );
        let results = write(
            dir.path(),
            "results.csv",
            "id,status,duration_sec,raw_name\nTC-001,PASS,1.23,test_login_ok\n,failed,4.5,test_TC-002_checkout\nTC-003,skipped,0,test_refund_intent\nTC-999,failed,0.5,test_unknown\n",
        );
        let request = ReportRequest {
            input: ReportInput::Files { cases, results },
            ..ReportRequest::demo(dir.path().join("r.md"))
        };
        let rendered = pipeline().render(&request).unwrap();
        let demo = pipeline().render(&ReportRequest::demo("unused.md")).unwrap();
        assert_eq!(rendered.report.metrics(), demo.report.metrics());
        assert!((rendered.report.metrics().rate(FAILURE_RATE) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_junit_results_match_demo_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cases = write(
            dir.path(),
            "cases.csv",
            "id,title\nTC-001,Login works\nTC-002,Checkout works\nTC-003,Refund intent supported\n",
        );
        let results = write(
            dir.path(),
            "junit.xml",
            r#"<?xml version="1.0"?>
<testsuite name="e2e">
  <testcase classname="auth" name="test_TC-001_login_ok" time="1.23"/>
  <testcase classname="payments" name="test_TC-002_checkout" time="4.5"><failure/></testcase>
  <testcase classname="support" name="test_TC-003_refund" time="0"><skipped/></testcase>
  <testcase classname="misc" name="test_unknown" time="0.5"><failure/></testcase>
</testsuite>
"#,
        );
        let request = ReportRequest {
            input: ReportInput::Files { cases, results },
            ..ReportRequest::demo(dir.path().join("r.md"))
        };
        let rendered = pipeline().render(&request).unwrap();
        let demo = pipeline().render(&ReportRequest::demo("unused.md")).unwrap();
        assert_eq!(rendered.report.metrics(), demo.report.metrics());
        assert_eq!(rendered.report.score().overall_score(), 38.0);
    }

    #[test]
    fn test_optional_sections_do_not_change_score() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write(
            dir.path(),
            "artifacts.json",
            r#"{"intents": [{"predicted": "refund", "actual": "refund"}]}"#,
        );
        let transcript = write(
            dir.path(),
            "current.json",
            r#"{"turns": [{"user_text": "hi", "assistant_text": "hello", "expected_schema_valid": true,
                "tool_calls": [{"name": "t", "status": "error"}]}]}"#,
        );
        let baseline = write(dir.path(), "baseline.json", r#"{"turns": []}"#);

        let request = ReportRequest {
            artifacts: Some(artifacts),
            transcript: Some(transcript),
            baseline_transcript: Some(baseline),
            ..ReportRequest::demo(dir.path().join("r.md"))
        };
        let rendered = pipeline().render(&request).unwrap();

        assert_eq!(rendered.report.score().overall_score(), 38.0);
        let md = &rendered.markdown;
        assert!(md.contains("## Extracted Signals (advisory)"));
        assert!(md.contains("`intent_classification_accuracy`"));
        assert!(md.contains("## AI/LLM Stability Signals (optional)"));
        assert!(md.contains("- **HIGH**: Tool error rate increased by 1.000 (absolute)"));
    }

    #[test]
    fn test_missing_transcript_fails() {
        let request = ReportRequest {
            transcript: Some(PathBuf::from("/no/such/transcript.json")),
            ..ReportRequest::demo("unused.md")
        };
        assert!(pipeline().render(&request).is_err());
    }
}
