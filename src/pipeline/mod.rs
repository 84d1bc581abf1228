pub mod analysis;
pub mod cancel;
pub mod orchestrator;
pub mod remote;
pub mod upload;

pub use cancel::CancellationFlag;
pub use orchestrator::{
    Analyzer, ClassificationResult, DiagnosisError, FallbackOrchestrator, FallbackReason,
};
pub use upload::ImageUpload;
