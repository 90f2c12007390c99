//! Pluggable signal extractors.
//!
//! Each extractor turns run history and optional domain artifacts into
//! [`Signal`]s. Missing optional artifacts never fail an extraction; the
//! affected sub-analysis simply contributes nothing.

pub mod ai_agent;
pub mod generic;
pub mod history;

use crate::domain::agent_artifacts::AgentArtifacts;
use crate::domain::error::Result;
use crate::domain::signal::{Signal, SignalType};
use crate::domain::test_run::TestHistory;
use std::collections::BTreeMap;

pub use ai_agent::AiAgentExtractor;
pub use generic::GenericExtractor;

pub trait SignalExtractor {
    fn extract_signals(
        &self,
        history: &TestHistory,
        artifacts: Option<&AgentArtifacts>,
    ) -> Result<Vec<Signal>>;

    fn name(&self) -> &'static str;
}

/// Runs a fixed, ordered set of extractors and concatenates their output.
pub struct SignalOrchestrator {
    extractors: Vec<Box<dyn SignalExtractor + Send + Sync>>,
}

impl Default for SignalOrchestrator {
    fn default() -> Self {
        Self::new()
            .with_extractor(GenericExtractor::new())
            .with_extractor(AiAgentExtractor::new())
    }
}

impl SignalOrchestrator {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: impl SignalExtractor + Send + Sync + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn extract_all(
        &self,
        history: &TestHistory,
        artifacts: Option<&AgentArtifacts>,
    ) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();
        for extractor in &self.extractors {
            let extracted = extractor.extract_signals(history, artifacts)?;
            tracing::debug!(
                extractor = extractor.name(),
                count = extracted.len(),
                "Signals extracted"
            );
            signals.extend(extracted);
        }
        Ok(signals)
    }
}

/// Number of signals per type, for report summaries.
pub fn count_by_type(signals: &[Signal]) -> BTreeMap<SignalType, usize> {
    let mut counts = BTreeMap::new();
    for signal in signals {
        *counts.entry(signal.signal_type()).or_insert(0) += 1;
    }
    counts
}
