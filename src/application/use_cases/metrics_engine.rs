use crate::domain::metrics::{
    Metrics, FAILED, FAILURE_RATE, MAPPED_RESULTS, PASSED, SKIPPED, SKIP_RATE, TOTAL_CASES,
    TOTAL_RESULTS, UNMAPPED_RESULTS,
};
use crate::domain::test_case::{NormalizedData, TestStatus};

/// Derives the counting and rate metrics for one normalized run.
///
/// Status buckets count mapped results only, and both rates are taken over
/// the mapped population. `error` results land in no bucket.
pub fn compute_metrics(data: &NormalizedData) -> Metrics {
    let total_results = data.results.len();

    let mut mapped = 0usize;
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for result in &data.results {
        if !data.is_mapped(result) {
            continue;
        }
        mapped += 1;
        match result.status {
            TestStatus::Passed => passed += 1,
            TestStatus::Failed => failed += 1,
            TestStatus::Skipped => skipped += 1,
            TestStatus::Error => {}
        }
    }

    let unmapped = total_results - mapped;
    let failure_rate = ratio(failed, mapped);
    let skip_rate = ratio(skipped, mapped);

    if unmapped > 0 {
        tracing::warn!(
            unmapped,
            total_results,
            "Results reference unknown test cases"
        );
    }

    Metrics::new()
        .with(TOTAL_CASES, data.test_cases.len())
        .with(TOTAL_RESULTS, total_results)
        .with(MAPPED_RESULTS, mapped)
        .with(UNMAPPED_RESULTS, unmapped)
        .with(PASSED, passed)
        .with(FAILED, failed)
        .with(SKIPPED, skipped)
        .with(FAILURE_RATE, failure_rate)
        .with(SKIP_RATE, skip_rate)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
