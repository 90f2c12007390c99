pub mod drift_analyzer;
pub mod llm_readiness;
pub mod metrics_engine;
pub mod readiness_classifier;
pub mod readiness_pipeline;
pub mod signal_extractors;
