//! Named heuristic thresholds.
//!
//! These values were tuned by eye, not fitted to labelled data. They are kept
//! as named constants and every one that drives a decision can be overridden
//! through `HeuristicConfig`.

/// Largest upload accepted for analysis (10 MB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Largest decoded image accepted, in pixels (40 MP).
pub const MAX_PIXELS: u64 = 40_000_000;

/// Per-pixel color bin cutoffs (0-255 channel values).
pub mod color {
    pub const HEALTHY_GREEN_MIN: u8 = 100;
    pub const YELLOW_RED_GREEN_MIN: u8 = 150;
    pub const YELLOW_BLUE_MAX: u8 = 100;
    pub const BROWN_RED_MIN: u8 = 100;
    pub const BROWN_GREEN_MAX: u8 = 80;
    pub const BROWN_BLUE_MAX: u8 = 60;
    pub const SPOT_CHANNEL_MAX: u8 = 60;
    pub const MILDEW_RED_GREEN_MIN: u8 = 200;
    pub const MILDEW_BLUE_MIN: u8 = 180;
}

/// Combined-intensity (R+G+B, 0-765) difference that counts as an edge.
pub const EDGE_INTENSITY_THRESHOLD: u16 = 30;

/// Health metric weights and pest-risk levels.
pub mod metrics {
    pub const HEALTHY_WEIGHT: f32 = 0.6;
    pub const UNIFORMITY_WEIGHT: f32 = 0.4;
    pub const DISCOLORATION_WEIGHT: f32 = 0.8;
    pub const ROUGHNESS_WEIGHT: f32 = 0.2;
    pub const PEST_EDGE_DENSITY: f32 = 0.3;
    pub const PEST_RISK_HIGH: f32 = 0.7;
    pub const PEST_RISK_LOW: f32 = 0.2;
}

/// Disease indicator cutoffs (fractions of the image).
pub mod indicators {
    pub const FUNGAL_MILDEW: f32 = 0.05;
    pub const FUNGAL_BROWNING: f32 = 0.2;
    pub const BACTERIAL_SPOTTING: f32 = 0.15;
    pub const VIRAL_YELLOWING: f32 = 0.3;
    pub const VIRAL_UNIFORMITY_MAX: f32 = 0.7;
    pub const PEST_EDGE_DENSITY: f32 = 0.4;
    pub const NUTRIENT_YELLOWING: f32 = 0.4;
    pub const NUTRIENT_SPOTTING_MAX: f32 = 0.1;
}

/// Classifier rule guards.
pub mod rules {
    pub const HEALTHY_MIN_HEALTH: f32 = 0.7;
    pub const HEALTHY_MAX_DISEASE_RISK: f32 = 0.3;
    pub const MILDEW_FRACTION: f32 = 0.08;
    pub const LEAF_SPOT_SPOTTING: f32 = 0.15;
    pub const RUST_BROWNING: f32 = 0.25;
    pub const PEST_EDGE_DENSITY: f32 = 0.4;
    pub const CATERPILLAR_SPOTTING_MAX: f32 = 0.1;
    pub const APHID_YELLOWING: f32 = 0.3;
}

/// Shape feature cutoffs.
pub mod shape {
    pub const SPOT_PATTERN_MIN: f32 = 0.1;
    pub const LEAF_INTEGRITY_MIN: f32 = 0.6;
}

/// Confidence band boundaries used when presenting a result.
pub mod bands {
    pub const HIGH: f32 = 0.85;
    pub const MEDIUM: f32 = 0.70;
}

/// Upper bound (exclusive) of the deterministic jitter added to rule bases.
pub const JITTER_SPAN: f32 = 0.1;

/// Default remote confidence at or below which the local pipeline takes over.
pub const MIN_REMOTE_CONFIDENCE: f32 = 0.6;

// ═══════════════════════════════════════════════════════════
// Overridable configuration
// ═══════════════════════════════════════════════════════════

/// Channel cutoffs for the five color bins.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorThresholds {
    pub healthy_green_min: u8,
    pub yellow_red_green_min: u8,
    pub yellow_blue_max: u8,
    pub brown_red_min: u8,
    pub brown_green_max: u8,
    pub brown_blue_max: u8,
    pub spot_channel_max: u8,
    pub mildew_red_green_min: u8,
    pub mildew_blue_min: u8,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            healthy_green_min: color::HEALTHY_GREEN_MIN,
            yellow_red_green_min: color::YELLOW_RED_GREEN_MIN,
            yellow_blue_max: color::YELLOW_BLUE_MAX,
            brown_red_min: color::BROWN_RED_MIN,
            brown_green_max: color::BROWN_GREEN_MAX,
            brown_blue_max: color::BROWN_BLUE_MAX,
            spot_channel_max: color::SPOT_CHANNEL_MAX,
            mildew_red_green_min: color::MILDEW_RED_GREEN_MIN,
            mildew_blue_min: color::MILDEW_BLUE_MIN,
        }
    }
}

/// Base confidence for each classifier outcome, before jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBaseConfidence {
    pub healthy: f32,
    pub powdery_mildew: f32,
    pub leaf_spot: f32,
    pub rust: f32,
    pub caterpillars: f32,
    pub spider_mites: f32,
    pub aphids: f32,
    pub thrips: f32,
    pub fallback_leaf_spot: f32,
    pub fallback_aphids: f32,
}

impl Default for RuleBaseConfidence {
    fn default() -> Self {
        Self {
            healthy: 0.85,
            powdery_mildew: 0.88,
            leaf_spot: 0.82,
            rust: 0.79,
            caterpillars: 0.84,
            spider_mites: 0.81,
            aphids: 0.76,
            thrips: 0.73,
            fallback_leaf_spot: 0.70,
            fallback_aphids: 0.68,
        }
    }
}

/// Tunable inputs of the local heuristic pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    pub color: ColorThresholds,
    pub edge_intensity_threshold: u16,
    pub rule_base: RuleBaseConfidence,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            color: ColorThresholds::default(),
            edge_intensity_threshold: EDGE_INTENSITY_THRESHOLD,
            rule_base: RuleBaseConfidence::default(),
        }
    }
}
