//! Signals from optional AI-agent artifacts: conversations, intents, flows.

mod conversation;
mod flow;
mod intent;

use super::SignalExtractor;
use crate::domain::agent_artifacts::AgentArtifacts;
use crate::domain::error::Result;
use crate::domain::signal::Signal;
use crate::domain::test_run::TestHistory;

#[derive(Debug, Default, Clone, Copy)]
pub struct AiAgentExtractor;

impl AiAgentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SignalExtractor for AiAgentExtractor {
    fn extract_signals(
        &self,
        _history: &TestHistory,
        artifacts: Option<&AgentArtifacts>,
    ) -> Result<Vec<Signal>> {
        let Some(artifacts) = artifacts else {
            return Ok(Vec::new());
        };

        let mut signals = conversation::analyze(artifacts.conversations.as_deref())?;
        signals.extend(intent::analyze(artifacts.intents.as_deref())?);
        signals.extend(flow::analyze(artifacts.flows.as_deref())?);
        Ok(signals)
    }

    fn name(&self) -> &'static str {
        "ai_agent"
    }
}
