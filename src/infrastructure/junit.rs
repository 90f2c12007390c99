//! JUnit XML results, as emitted by pytest, surefire, jest-junit and friends.
//!
//! Every `<testcase>` becomes one [`RawTestResult`]. The status comes from
//! its children: `<error>`, then `<failure>`, then `<skipped>`; a test case
//! with none of them passed. JUnit carries no case id, so `id` stays empty
//! and the normalizer recovers it from `raw_name` (`name`, else `classname`).

use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::{decode, RawTestResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Outcome {
    Passed,
    Skipped,
    Failed,
    Error,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    fn from_child(tag: &[u8]) -> Option<Self> {
        match tag {
            b"skipped" => Some(Self::Skipped),
            b"failure" => Some(Self::Failed),
            b"error" => Some(Self::Error),
            _ => None,
        }
    }
}

struct PendingCase {
    line: usize,
    raw_name: Option<String>,
    duration_sec: Option<f64>,
    outcome: Outcome,
}

impl PendingCase {
    fn into_result(self) -> RawTestResult {
        RawTestResult {
            line: self.line,
            id: None,
            status: self.outcome.as_str().to_string(),
            duration_sec: self.duration_sec,
            raw_name: self.raw_name,
        }
    }
}

pub fn read_junit_results(path: &Path) -> Result<Vec<RawTestResult>> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("JUnit file not found: {}", path.display()))
        }
        _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
    })?;
    parse_junit(&decode(&bytes))
}

pub fn parse_junit(content: &str) -> Result<Vec<RawTestResult>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut pending: Option<PendingCase> = None;
    let mut lines = LineCounter::new(content);

    loop {
        let event = reader.read_event().map_err(|e| {
            AppError::ParseError(format!(
                "Invalid JUnit XML at byte {}: {}",
                reader.error_position(),
                e
            ))
        })?;
        let line = lines.line_at(reader.buffer_position() as usize);

        match event {
            Event::Start(tag) if tag.local_name().as_ref() == b"testcase" => {
                pending = Some(testcase(&tag, line)?);
            }
            Event::Empty(tag) if tag.local_name().as_ref() == b"testcase" => {
                results.push(testcase(&tag, line)?.into_result());
            }
            Event::Start(tag) | Event::Empty(tag) => {
                if let (Some(case), Some(outcome)) = (
                    pending.as_mut(),
                    Outcome::from_child(tag.local_name().as_ref()),
                ) {
                    case.outcome = case.outcome.max(outcome);
                }
            }
            Event::End(tag) if tag.local_name().as_ref() == b"testcase" => {
                if let Some(case) = pending.take() {
                    results.push(case.into_result());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if results.is_empty() {
        tracing::warn!("JUnit document contains no <testcase> elements");
    }
    Ok(results)
}

fn testcase(tag: &BytesStart<'_>, line: usize) -> Result<PendingCase> {
    let name = attribute(tag, "name", line)?;
    let classname = attribute(tag, "classname", line)?;
    let duration_sec = attribute(tag, "time", line)?
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                AppError::ParseError(format!("line {}: invalid testcase time '{}'", line, raw))
            })
        })
        .transpose()?;

    Ok(PendingCase {
        line,
        raw_name: name.or(classname),
        duration_sec,
        outcome: Outcome::Passed,
    })
}

fn attribute(tag: &BytesStart<'_>, key: &str, line: usize) -> Result<Option<String>> {
    let bad = |e: &dyn std::fmt::Display| {
        AppError::ParseError(format!("line {}: bad '{}' attribute: {}", line, key, e))
    };
    let Some(attr) = tag.try_get_attribute(key).map_err(|e| bad(&e))? else {
        return Ok(None);
    };
    let value = attr.unescape_value().map_err(|e| bad(&e))?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Byte offset to 1-based line. Offsets only move forward, so the whole
/// document is scanned once.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            bytes: content.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        let end = offset.min(self.bytes.len());
        if end > self.offset {
            self.line += self.bytes[self.offset..end]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = end;
        }
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<testsuites>
  <testsuite name="pytest" tests="5" failures="1" errors="1" skipped="1">
    <testcase classname="tests.test_auth" name="test_TC-001_login_ok" time="1.23"/>
    <testcase classname="tests.test_pay" name="test_TC-002_checkout" time="4.5">
      <failure message="assert 500 == 200">Traceback...</failure>
    </testcase>
    <testcase classname="tests.test_support" name="test_TC-003_refund" time="0">
      <skipped message="flaky upstream"/>
    </testcase>
    <testcase classname="tests.test_misc" name="test_unknown" time="0.5">
      <error message="fixture exploded"/>
      <failure message="also failed"/>
    </testcase>
    <testcase classname="tests.test_only_class"/>
  </testsuite>
</testsuites>
"#;

    #[test]
    fn test_parse_maps_children_to_status() {
        let results = parse_junit(REPORT).unwrap();
        let statuses: Vec<&str> = results.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["passed", "failed", "skipped", "error", "passed"]);

        assert_eq!(results[0].raw_name.as_deref(), Some("test_TC-001_login_ok"));
        assert_eq!(results[0].duration_sec, Some(1.23));
        assert_eq!(results[0].id, None);
        assert_eq!(results[0].line, 4);
        assert_eq!(results[4].raw_name.as_deref(), Some("tests.test_only_class"));
        assert_eq!(results[4].duration_sec, None);
    }

    #[test]
    fn test_invalid_time_is_parse_error() {
        let err = parse_junit(r#"<testsuite><testcase name="a" time="soon"/></testsuite>"#)
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(msg) if msg.contains("'soon'")));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_junit("<testsuite><testcase name=\"a\"></testsuite>").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_escaped_names_are_unescaped() {
        let results =
            parse_junit(r#"<testsuite><testcase name="test_a &amp; b[1]"/></testsuite>"#).unwrap();
        assert_eq!(results[0].raw_name.as_deref(), Some("test_a & b[1]"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_junit_results(Path::new("/no/such/junit.xml")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
