use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::knowledge::Label;

/// Decoded image: width, height and RGBA pixels in row-major order.
///
/// Immutable once built; the analysis stages only read it.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Build from raw RGBA bytes. Returns `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, rgba).map(Self::new)
    }

    /// Uniformly colored buffer, mostly useful for tests and calibration.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.image.pixels().map(|p| p.0)
    }

    /// Pixel rows, each `width` pixels long.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let stride = self.width() as usize * 4;
        self.image.as_raw().chunks_exact(stride.max(4))
    }
}

/// Fraction of pixels falling into each color bin. Sum is at most 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorDistribution {
    pub healthy: f32,
    pub yellowing: f32,
    pub browning: f32,
    pub spotting: f32,
    pub mildew: f32,
}

impl ColorDistribution {
    pub fn total(&self) -> f32 {
        self.healthy + self.yellowing + self.browning + self.spotting + self.mildew
    }
}

/// Vertical-neighbour edge statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureMetrics {
    pub edge_density: f32,
    pub uniformity: f32,
}

impl Default for TextureMetrics {
    fn default() -> Self {
        Self {
            edge_density: 0.0,
            uniformity: 1.0,
        }
    }
}

/// Coarse shape cues derived from the color distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    pub spot_patterns: bool,
    pub leaf_integrity: bool,
    pub discoloration: f32,
}

/// Aggregate scores, each clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub overall_health: f32,
    pub disease_risk: f32,
    pub pest_risk: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseIndicators {
    pub fungal_signs: bool,
    pub bacterial_signs: bool,
    pub viral_signs: bool,
    pub pest_damage: bool,
    pub nutritional_deficiency: bool,
}

/// Everything the local pipeline measured about one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafAnalysis {
    pub width: u32,
    pub height: u32,
    pub color: ColorDistribution,
    pub texture: TextureMetrics,
    pub shape: ShapeFeatures,
    pub health: HealthMetrics,
    pub indicators: DiseaseIndicators,
}

impl LeafAnalysis {
    /// One-line human summary, e.g. `"Health score 92.0%, Disease risk 4.0%"`.
    pub fn summary(&self) -> String {
        format!(
            "Health score {:.1}%, Disease risk {:.1}%",
            self.health.overall_health * 100.0,
            self.health.disease_risk * 100.0
        )
    }
}

/// Classifier output before knowledge-base merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f32,
}

/// Ranked secondary candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub label: Option<Label>,
    pub confidence: f32,
}
