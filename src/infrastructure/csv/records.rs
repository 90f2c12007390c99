//! Raw test-case and test-result records, before normalization.

use super::csv_parser::{CsvParser, CsvRow};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::junit::read_junit_results;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTestCase {
    pub line: usize,
    pub id: String,
    pub title: String,
    pub priority: Option<String>,
    pub component: Option<String>,
    pub description: Option<String>,
}

/// A result row as exported by a test runner. `id` may be blank when the
/// runner only knows the test function name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawTestResult {
    #[serde(skip)]
    pub line: usize,
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub raw_name: Option<String>,
}

pub fn read_test_cases(path: &Path, parser: &CsvParser) -> Result<Vec<RawTestCase>> {
    let rows = parser.parse_file(path)?;
    let cases = rows.iter().map(case_from_row).collect::<Result<Vec<_>>>()?;
    tracing::info!(path = %path.display(), count = cases.len(), "Loaded test cases");
    Ok(cases)
}

/// Reads results from JUnit XML (`.xml`), a `.json` array or, for any other
/// extension, CSV.
pub fn read_test_results(path: &Path, parser: &CsvParser) -> Result<Vec<RawTestResult>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let results = match extension.as_deref() {
        Some("xml") => read_junit_results(path)?,
        Some("json") => {
            let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::NotFound(format!("Results file not found: {}", path.display()))
                }
                _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
            })?;
            parse_results_json(&content)?
        }
        _ => parser
            .parse_file(path)?
            .iter()
            .map(result_from_row)
            .collect::<Result<Vec<_>>>()?,
    };

    tracing::info!(path = %path.display(), count = results.len(), "Loaded test results");
    Ok(results)
}

pub fn parse_results_json(content: &str) -> Result<Vec<RawTestResult>> {
    let mut results: Vec<RawTestResult> = serde_json::from_str(content)?;
    for (index, result) in results.iter_mut().enumerate() {
        result.line = index + 1;
    }
    Ok(results)
}

fn case_from_row(row: &CsvRow) -> Result<RawTestCase> {
    Ok(RawTestCase {
        line: row.line,
        id: row.require("id")?.to_string(),
        title: row.require("title")?.to_string(),
        priority: row.get("priority").map(str::to_string),
        component: row.get("component").map(str::to_string),
        description: row.get("description").map(str::to_string),
    })
}

fn result_from_row(row: &CsvRow) -> Result<RawTestResult> {
    let duration_sec = row
        .get("duration_sec")
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                AppError::ParseError(format!(
                    "line {}: invalid duration_sec '{}'",
                    row.line, raw
                ))
            })
        })
        .transpose()?;

    Ok(RawTestResult {
        line: row.line,
        id: row.get("id").map(str::to_string),
        status: row.require("status")?.to_string(),
        duration_sec,
        raw_name: row.get("raw_name").map(str::to_string),
    })
}
