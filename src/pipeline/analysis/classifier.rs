//! Ordered rule classifier.
//!
//! Rules are evaluated top to bottom and the first match decides the label.
//! The confidence is the rule's base plus a small jitter derived from an
//! explicit seed, never from pixel content, so identical inputs always give
//! identical output.

use serde::{Deserialize, Serialize};

use super::thresholds::{rules, RuleBaseConfidence};
use super::types::{LeafAnalysis, Prediction};
use crate::knowledge::Label;

/// Reproducibility seed for the confidence jitter.
///
/// Usually derived from the upload's file name, but callers may pass any
/// stable value. `JitterSeed::NONE` disables jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct JitterSeed(pub i32);

impl JitterSeed {
    pub const NONE: JitterSeed = JitterSeed(0);

    /// 32-bit rolling hash (`h = h * 31 + unit`) over the UTF-16 code units of `text`.
    pub fn from_text(text: &str) -> Self {
        let hash = text
            .encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
        JitterSeed(hash)
    }

    /// Jitter in [0, 0.1) with 0.001 resolution.
    pub fn jitter(&self) -> f32 {
        (self.0.unsigned_abs() % 100) as f32 / 1000.0
    }
}

/// Apply the ordered rules to one analysis.
pub fn classify(analysis: &LeafAnalysis, seed: JitterSeed, base: &RuleBaseConfidence) -> Prediction {
    let (label, base_confidence) = select_rule(analysis, base);
    Prediction {
        label,
        confidence: (base_confidence + seed.jitter()).min(1.0),
    }
}

fn select_rule(analysis: &LeafAnalysis, base: &RuleBaseConfidence) -> (Label, f32) {
    let color = &analysis.color;
    let health = &analysis.health;
    let ind = &analysis.indicators;
    let edge_density = analysis.texture.edge_density;

    if health.overall_health > rules::HEALTHY_MIN_HEALTH
        && health.disease_risk < rules::HEALTHY_MAX_DISEASE_RISK
    {
        return (Label::Healthy, base.healthy);
    }

    if ind.fungal_signs && color.mildew > rules::MILDEW_FRACTION {
        return (Label::PowderyMildew, base.powdery_mildew);
    }

    if ind.bacterial_signs && color.spotting > rules::LEAF_SPOT_SPOTTING {
        return (Label::LeafSpot, base.leaf_spot);
    }

    if color.browning > rules::RUST_BROWNING && ind.fungal_signs {
        return (Label::Rust, base.rust);
    }

    if ind.pest_damage && edge_density > rules::PEST_EDGE_DENSITY {
        return if color.spotting < rules::CATERPILLAR_SPOTTING_MAX {
            (Label::Caterpillars, base.caterpillars)
        } else {
            (Label::SpiderMites, base.spider_mites)
        };
    }

    if color.yellowing > rules::APHID_YELLOWING && !ind.pest_damage {
        return (Label::Aphids, base.aphids);
    }

    if ind.viral_signs {
        return (Label::Thrips, base.thrips);
    }

    if health.disease_risk > health.pest_risk {
        (Label::LeafSpot, base.fallback_leaf_spot)
    } else {
        (Label::Aphids, base.fallback_aphids)
    }
}
