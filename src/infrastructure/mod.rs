#[path = "config/mod.rs"]
pub mod config_mod;
pub use config_mod as config;
pub mod artifacts;
pub mod csv;
pub mod junit;
pub mod logging;
pub mod normalizer;
pub mod reporting;
pub mod transcript_loader;
