use super::super::generic::percent;
use crate::domain::agent_artifacts::IntentRecord;
use crate::domain::error::Result;
use crate::domain::signal::{metadata, Signal};
use serde_json::json;
use std::collections::BTreeMap;

/// Classification accuracy (when every record carries both `predicted` and
/// `actual` keys, null values included) and label distribution diversity
/// (when there is more than one record).
pub fn analyze(intents: Option<&[IntentRecord]>) -> Result<Vec<Signal>> {
    let Some(intents) = intents.filter(|i| !i.is_empty()) else {
        return Ok(Vec::new());
    };

    let total = intents.len();
    let mut signals = Vec::new();

    if intents.iter().all(IntentRecord::has_ground_truth) {
        let correct = intents
            .iter()
            .filter(|i| i.predicted() == i.actual())
            .count();
        let accuracy = correct as f64 / total as f64;
        signals.push(Signal::stability(
            "intent_classification_accuracy",
            accuracy * 100.0,
            format!("Intent classification accuracy: {}/{}", correct, total),
            vec![
                format!("Correct classifications: {}", correct),
                format!("Total classifications: {}", total),
                format!("Accuracy: {}", percent(accuracy)),
            ],
            metadata([("accuracy", json!(accuracy)), ("total", json!(total))]),
        )?);
    }

    if total > 1 {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for intent in intents {
            *counts.entry(intent.label()).or_insert(0) += 1;
        }

        let entropy = shannon_entropy(counts.values().copied(), total);
        let max_entropy = (counts.len() as f64).log2();
        let normalized = if max_entropy > 0.0 {
            entropy / max_entropy
        } else {
            0.0
        };

        signals.push(Signal::stability(
            "intent_distribution_diversity",
            normalized * 100.0,
            "Diversity of intent classifications",
            vec![
                format!("Unique intent types: {}", counts.len()),
                format!("Intent distribution entropy: {:.2}", entropy),
            ],
            metadata([
                ("entropy", json!(entropy)),
                ("unique_types", json!(counts.len())),
            ]),
        )?);
    }

    Ok(signals)
}

fn shannon_entropy(counts: impl Iterator<Item = usize>, total: usize) -> f64 {
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}
