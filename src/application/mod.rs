pub mod use_cases;

pub use use_cases::readiness_pipeline::{ReadinessPipelineUseCase, ReportInput, ReportRequest};
