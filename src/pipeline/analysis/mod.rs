pub mod types;
pub mod thresholds;
pub mod decode;
pub mod features;
pub mod metrics;
pub mod classifier;
pub mod alternatives;
pub mod local;

pub use types::*;
pub use decode::{decode_image, validate_upload};
pub use features::{analyze_color_distribution, analyze_shape, analyze_texture};
pub use metrics::{compute_health_metrics, detect_indicators};
pub use classifier::{classify, JitterSeed};
pub use alternatives::rank_alternatives;
pub use local::{LocalHeuristicAnalyzer, LocalOutcome};
pub use thresholds::{ColorThresholds, HeuristicConfig, RuleBaseConfidence};

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Upload is empty")]
    EmptyUpload,

    #[error("Image too large: {width}x{height} exceeds the pixel limit")]
    TooManyPixels { width: u32, height: u32 },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reading the image timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Size-ceiling and empty-upload rejections, raised before any decode.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalysisError::FileTooLarge { .. } | AnalysisError::EmptyUpload
        )
    }
}
