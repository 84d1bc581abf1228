//! Health score aggregation and disease indicator detection.
//!
//! Both are pure functions of the extracted features.

use super::thresholds::{indicators, metrics};
use super::types::{ColorDistribution, DiseaseIndicators, HealthMetrics, TextureMetrics};

/// Clamp to [0, 1]. NaN maps to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn compute_health_metrics(color: &ColorDistribution, texture: &TextureMetrics) -> HealthMetrics {
    let overall_health = clamp_unit(
        metrics::HEALTHY_WEIGHT * color.healthy + metrics::UNIFORMITY_WEIGHT * texture.uniformity,
    );

    let discoloration = color.yellowing + color.browning + color.spotting;
    let disease_risk = clamp_unit(
        metrics::DISCOLORATION_WEIGHT * discoloration
            + metrics::ROUGHNESS_WEIGHT * (1.0 - texture.uniformity),
    );

    let pest_risk = if texture.edge_density > metrics::PEST_EDGE_DENSITY {
        metrics::PEST_RISK_HIGH
    } else {
        metrics::PEST_RISK_LOW
    };

    HealthMetrics {
        overall_health,
        disease_risk,
        pest_risk: clamp_unit(pest_risk),
    }
}

pub fn detect_indicators(color: &ColorDistribution, texture: &TextureMetrics) -> DiseaseIndicators {
    DiseaseIndicators {
        fungal_signs: color.mildew > indicators::FUNGAL_MILDEW
            || color.browning > indicators::FUNGAL_BROWNING,
        bacterial_signs: color.spotting > indicators::BACTERIAL_SPOTTING,
        viral_signs: color.yellowing > indicators::VIRAL_YELLOWING
            && texture.uniformity < indicators::VIRAL_UNIFORMITY_MAX,
        pest_damage: texture.edge_density > indicators::PEST_EDGE_DENSITY,
        nutritional_deficiency: color.yellowing > indicators::NUTRIENT_YELLOWING
            && color.spotting < indicators::NUTRIENT_SPOTTING_MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(edge_density: f32) -> TextureMetrics {
        TextureMetrics {
            edge_density,
            uniformity: 1.0 - edge_density,
        }
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.3), 0.3);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
    }

    #[test]
    fn fully_healthy_smooth_leaf() {
        let color = ColorDistribution {
            healthy: 1.0,
            ..Default::default()
        };
        let m = compute_health_metrics(&color, &texture(0.0));
        assert!((m.overall_health - 1.0).abs() < 1e-6);
        assert_eq!(m.disease_risk, 0.0);
        assert!((m.pest_risk - 0.2).abs() < 1e-6);
    }

    #[test]
    fn disease_risk_weights_discoloration_and_roughness() {
        let color = ColorDistribution {
            yellowing: 0.2,
            browning: 0.1,
            spotting: 0.1,
            ..Default::default()
        };
        let m = compute_health_metrics(&color, &texture(0.5));
        // 0.8 * 0.4 + 0.2 * 0.5
        assert!((m.disease_risk - 0.42).abs() < 1e-6);
        assert!((m.pest_risk - 0.7).abs() < 1e-6);
    }

    #[test]
    fn pest_risk_threshold_is_strict() {
        let color = ColorDistribution::default();
        assert!((compute_health_metrics(&color, &texture(0.3)).pest_risk - 0.2).abs() < 1e-6);
        assert!((compute_health_metrics(&color, &texture(0.31)).pest_risk - 0.7).abs() < 1e-6);
    }

    #[test]
    fn metrics_clamped_for_out_of_range_inputs() {
        let color = ColorDistribution {
            healthy: 2.0,
            yellowing: 1.0,
            browning: 1.0,
            spotting: 1.0,
            mildew: 0.0,
        };
        let rough = TextureMetrics {
            edge_density: 3.0,
            uniformity: -2.0,
        };
        let m = compute_health_metrics(&color, &rough);
        for v in [m.overall_health, m.disease_risk, m.pest_risk] {
            assert!((0.0..=1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn dark_spotting_flags_bacterial_only() {
        let color = ColorDistribution {
            spotting: 1.0,
            ..Default::default()
        };
        let ind = detect_indicators(&color, &texture(0.0));
        assert!(ind.bacterial_signs);
        assert!(!ind.fungal_signs);
        assert!(!ind.viral_signs);
        assert!(!ind.pest_damage);
        assert!(!ind.nutritional_deficiency);
    }

    #[test]
    fn fungal_from_mildew_or_browning() {
        let mildew = ColorDistribution {
            mildew: 0.06,
            ..Default::default()
        };
        assert!(detect_indicators(&mildew, &texture(0.0)).fungal_signs);

        let browning = ColorDistribution {
            browning: 0.21,
            ..Default::default()
        };
        assert!(detect_indicators(&browning, &texture(0.0)).fungal_signs);
    }

    #[test]
    fn viral_needs_yellowing_and_low_uniformity() {
        let color = ColorDistribution {
            yellowing: 0.35,
            spotting: 0.2,
            ..Default::default()
        };
        assert!(!detect_indicators(&color, &texture(0.2)).viral_signs);
        assert!(detect_indicators(&color, &texture(0.35)).viral_signs);
    }

    #[test]
    fn nutritional_deficiency_needs_low_spotting() {
        let color = ColorDistribution {
            yellowing: 0.5,
            spotting: 0.05,
            ..Default::default()
        };
        assert!(detect_indicators(&color, &texture(0.0)).nutritional_deficiency);

        let spotted = ColorDistribution {
            spotting: 0.2,
            ..color
        };
        assert!(!detect_indicators(&spotted, &texture(0.0)).nutritional_deficiency);
    }

    #[test]
    fn pest_damage_above_point_four_edges() {
        let color = ColorDistribution::default();
        assert!(!detect_indicators(&color, &texture(0.4)).pest_damage);
        assert!(detect_indicators(&color, &texture(0.41)).pest_damage);
    }
}
