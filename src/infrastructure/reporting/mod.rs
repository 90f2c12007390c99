pub mod exporter;
pub mod llm_section;
pub mod markdown;

pub use exporter::save_markdown_report;
pub use llm_section::{build_drift_report, build_stability_section, signals_to_markdown};
pub use markdown::{build_markdown_report, build_signals_section};
