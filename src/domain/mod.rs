pub mod agent_artifacts;
pub mod drift;
pub mod error;
pub mod metrics;
pub mod readiness;
pub mod signal;
pub mod test_case;
pub mod test_run;
pub mod transcript;
