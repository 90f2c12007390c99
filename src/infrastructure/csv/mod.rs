// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, encoding detection, and raw record loading

mod csv_parser;
mod records;

pub use csv_parser::{clean_field_name, decode, CsvParser, CsvRow};
pub use records::{
    parse_results_json, read_test_cases, read_test_results, RawTestCase, RawTestResult,
};
