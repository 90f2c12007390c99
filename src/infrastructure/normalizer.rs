use crate::domain::error::{AppError, Result};
use crate::domain::test_case::{NormalizedData, TestCase, TestResult, TestStatus};
use crate::infrastructure::config::NormalizerConfig;
use crate::infrastructure::csv::{RawTestCase, RawTestResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());

/// Turns raw case and result rows into [`NormalizedData`].
///
/// Results whose id has no matching case are kept as-is; they are the
/// unmapped results the metrics engine reports on.
pub struct Normalizer {
    case_id_re: Regex,
    status_aliases: BTreeMap<String, TestStatus>,
}

impl Normalizer {
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        let case_id_re = Regex::new(&config.case_id_pattern).map_err(|e| {
            AppError::ConfigError(format!("Invalid case id pattern: {}", e))
        })?;
        let status_aliases = config
            .status_aliases
            .iter()
            .map(|(alias, status)| {
                let status = status
                    .parse::<TestStatus>()
                    .map_err(AppError::ConfigError)?;
                Ok((status_key(alias), status))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            case_id_re,
            status_aliases,
        })
    }

    pub fn normalize(
        &self,
        cases: Vec<RawTestCase>,
        results: Vec<RawTestResult>,
    ) -> Result<NormalizedData> {
        let mut test_cases = BTreeMap::new();
        for raw in cases {
            let case = Self::normalize_case(raw)?;
            if test_cases.contains_key(&case.id) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate test case id: {}",
                    case.id
                )));
            }
            test_cases.insert(case.id.clone(), case);
        }

        let results = results
            .into_iter()
            .map(|raw| self.normalize_result(raw))
            .collect::<Result<Vec<_>>>()?;

        let dangling: BTreeSet<&str> = results
            .iter()
            .filter(|r| !test_cases.contains_key(&r.id))
            .map(|r| r.id.as_str())
            .collect();
        if !dangling.is_empty() {
            tracing::warn!(ids = ?dangling, "Results without a matching test case");
        }

        Ok(NormalizedData::new(test_cases, results))
    }

    fn normalize_case(raw: RawTestCase) -> Result<TestCase> {
        let id = raw.id.trim().to_string();
        let title = raw.title.trim().to_string();
        if id.is_empty() || title.is_empty() {
            return Err(AppError::ValidationError(format!(
                "line {}: test case needs a non-blank id and title",
                raw.line
            )));
        }
        Ok(TestCase {
            id,
            title,
            priority: non_blank(raw.priority),
            component: non_blank(raw.component),
            description: non_blank(raw.description),
        })
    }

    fn normalize_result(&self, raw: RawTestResult) -> Result<TestResult> {
        let raw_name = non_blank(raw.raw_name);
        let id = match non_blank(raw.id) {
            Some(id) => id,
            None => self.id_from_raw_name(raw_name.as_deref()).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "line {}: result has neither id nor raw_name",
                    raw.line
                ))
            })?,
        };
        let status = self.status(&raw.status).ok_or_else(|| {
            AppError::ValidationError(format!(
                "line {}: unknown status '{}' for {}",
                raw.line, raw.status, id
            ))
        })?;

        if let Some(duration) = raw.duration_sec.filter(|d| !d.is_finite() || *d < 0.0) {
            return Err(AppError::ValidationError(format!(
                "line {}: duration_sec must be a non-negative number, got {} for {}",
                raw.line, duration, id
            )));
        }

        Ok(TestResult {
            id,
            status,
            duration_sec: raw.duration_sec,
            raw_name,
        })
    }

    fn id_from_raw_name(&self, raw_name: Option<&str>) -> Option<String> {
        let raw_name = raw_name?;
        let id = self
            .case_id_re
            .find(raw_name)
            .map_or(raw_name, |m| m.as_str());
        Some(id.to_string())
    }

    /// Canonical names first, then the alias table; case-insensitive.
    pub fn status(&self, raw: &str) -> Option<TestStatus> {
        let key = status_key(raw);
        key.parse::<TestStatus>()
            .ok()
            .or_else(|| self.status_aliases.get(&key).copied())
    }
}

// "Not Run" and "not-run" both become "not_run".
fn status_key(raw: &str) -> String {
    WHITESPACE_RE
        .replace_all(raw.trim(), "_")
        .to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
