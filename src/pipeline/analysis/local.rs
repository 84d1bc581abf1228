use std::time::Instant;

use tracing::debug;

use super::classifier::{classify, JitterSeed};
use super::decode::decode_image;
use super::features::{analyze_color_distribution, analyze_shape, analyze_texture};
use super::metrics::{compute_health_metrics, detect_indicators};
use super::thresholds::HeuristicConfig;
use super::types::{LeafAnalysis, PixelBuffer, Prediction};
use super::AnalysisError;
use crate::pipeline::cancel::CancellationFlag;

/// Raw output of the local pipeline, before the knowledge-base merge.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalOutcome {
    pub prediction: Prediction,
    pub analysis: LeafAnalysis,
}

/// Offline analyzer: decode, features, metrics, indicators, rules.
///
/// Synchronous and CPU-bound. Holds no mutable state, so one instance can
/// serve any number of concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct LocalHeuristicAnalyzer {
    config: HeuristicConfig,
}

impl LocalHeuristicAnalyzer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Run the whole local pipeline over encoded image bytes.
    ///
    /// `cancel` is checked between stages; a cancelled request stops at the
    /// next stage boundary with `AnalysisError::Cancelled`.
    pub fn analyze(
        &self,
        bytes: &[u8],
        seed: JitterSeed,
        cancel: &CancellationFlag,
    ) -> Result<LocalOutcome, AnalysisError> {
        let start = Instant::now();

        checkpoint(cancel)?;
        let buffer = decode_image(bytes)?;

        checkpoint(cancel)?;
        let analysis = self.analyze_pixels(&buffer);

        checkpoint(cancel)?;
        let prediction = classify(&analysis, seed, &self.config.rule_base);

        debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Local heuristic classification complete"
        );

        Ok(LocalOutcome {
            prediction,
            analysis,
        })
    }

    /// Feature extraction and aggregation over an already decoded buffer.
    pub fn analyze_pixels(&self, buffer: &PixelBuffer) -> LeafAnalysis {
        let color = analyze_color_distribution(buffer, &self.config.color);
        let texture = analyze_texture(buffer, self.config.edge_intensity_threshold);
        let health = compute_health_metrics(&color, &texture);
        let indicators = detect_indicators(&color, &texture);

        debug!(
            healthy = color.healthy,
            yellowing = color.yellowing,
            browning = color.browning,
            spotting = color.spotting,
            mildew = color.mildew,
            edge_density = texture.edge_density,
            overall_health = health.overall_health,
            disease_risk = health.disease_risk,
            pest_risk = health.pest_risk,
            "Leaf features extracted"
        );

        LeafAnalysis {
            width: buffer.width(),
            height: buffer.height(),
            color,
            texture,
            shape: analyze_shape(&color),
            health,
            indicators,
        }
    }
}

fn checkpoint(cancel: &CancellationFlag) -> Result<(), AnalysisError> {
    if cancel.is_cancelled() {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}
