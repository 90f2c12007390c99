// ============================================================
// CSV PARSER
// ============================================================
// Parse CSV files with encoding detection and header cleaning

use crate::domain::error::{AppError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::collections::BTreeMap;
use std::path::Path;

/// One data row keyed by cleaned header name.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    /// 1-based line of the record in the source, header included.
    pub line: usize,
    fields: BTreeMap<String, String>,
}

impl CsvRow {
    /// Field value, or `None` when the column is absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Like [`CsvRow::get`] but a missing value is a validation error.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            AppError::ValidationError(format!(
                "line {}: missing required column '{}'",
                self.line, name
            ))
        })
    }
}

/// CSV parser with encoding detection
pub struct CsvParser {
    /// Delimiter; detected from the content when unset
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Parse a CSV file and return rows
    pub fn parse_file(&self, path: &Path) -> Result<Vec<CsvRow>> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::NotFound(format!("CSV file not found: {}", path.display()))
            }
            _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        let content = decode(&bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<Vec<CsvRow>> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(clean_field_name)
            .collect();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            let line = record
                .position()
                .map_or(index + 2, |p| p.line() as usize);
            if is_blank(&record) {
                continue;
            }
            rows.push(Self::parse_row(line, &headers, &record));
        }

        Ok(rows)
    }

    fn parse_row(line: usize, headers: &[String], record: &StringRecord) -> CsvRow {
        let fields = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
            .collect();
        CsvRow { line, fields }
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<&str> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;
            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 (BOM stripped) when valid, Windows-1252 otherwise.
pub fn decode(bytes: &[u8]) -> String {
    let (content, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return content.into_owned();
    }
    tracing::warn!("Input is not valid UTF-8, decoding as Windows-1252");
    let (content, _, _) = WINDOWS_1252.decode(bytes);
    content.into_owned()
}

/// Lowercase snake_case header: non-alphanumerics become single underscores.
pub fn clean_field_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}
