//! Color-distribution and texture feature extraction.

use super::thresholds::{shape, ColorThresholds};
use super::types::{ColorDistribution, PixelBuffer, ShapeFeatures, TextureMetrics};

/// Color bin a single pixel falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBin {
    Healthy,
    Yellowing,
    Browning,
    Spotting,
    Mildew,
}

/// Classify one pixel. Rules are checked in bin order; the first match wins.
pub fn classify_pixel(rgb: [u8; 3], t: &ColorThresholds) -> Option<ColorBin> {
    let [r, g, b] = rgb;

    if g > r && g > b && g > t.healthy_green_min {
        Some(ColorBin::Healthy)
    } else if r > t.yellow_red_green_min && g > t.yellow_red_green_min && b < t.yellow_blue_max {
        Some(ColorBin::Yellowing)
    } else if r > t.brown_red_min && g < t.brown_green_max && b < t.brown_blue_max {
        Some(ColorBin::Browning)
    } else if r < t.spot_channel_max && g < t.spot_channel_max && b < t.spot_channel_max {
        Some(ColorBin::Spotting)
    } else if r > t.mildew_red_green_min && g > t.mildew_red_green_min && b > t.mildew_blue_min {
        Some(ColorBin::Mildew)
    } else {
        None
    }
}

/// Fraction of all pixels in each color bin. An empty buffer yields all zeros.
pub fn analyze_color_distribution(
    buffer: &PixelBuffer,
    thresholds: &ColorThresholds,
) -> ColorDistribution {
    let total = buffer.pixel_count();
    if total == 0 {
        return ColorDistribution::default();
    }

    let mut counts = [0u64; 5];
    for [r, g, b, _] in buffer.pixels() {
        let slot = match classify_pixel([r, g, b], thresholds) {
            Some(ColorBin::Healthy) => 0,
            Some(ColorBin::Yellowing) => 1,
            Some(ColorBin::Browning) => 2,
            Some(ColorBin::Spotting) => 3,
            Some(ColorBin::Mildew) => 4,
            None => continue,
        };
        counts[slot] += 1;
    }

    let fraction = |count: u64| (count as f64 / total as f64) as f32;
    ColorDistribution {
        healthy: fraction(counts[0]),
        yellowing: fraction(counts[1]),
        browning: fraction(counts[2]),
        spotting: fraction(counts[3]),
        mildew: fraction(counts[4]),
    }
}

/// Edge density from vertically adjacent pixel pairs.
///
/// Every pixel with a row below it is sampled once. Its combined intensity
/// (R+G+B) is compared with the pixel directly below; a difference above
/// `edge_threshold` counts as an edge. Fewer than two rows gives no samples
/// and therefore zero edge density.
pub fn analyze_texture(buffer: &PixelBuffer, edge_threshold: u16) -> TextureMetrics {
    if buffer.width() == 0 || buffer.height() < 2 {
        return TextureMetrics::default();
    }

    let intensity = |px: &[u8]| px[0] as i32 + px[1] as i32 + px[2] as i32;

    let mut sampled = 0u64;
    let mut edges = 0u64;
    for (row, below) in buffer.rows().zip(buffer.rows().skip(1)) {
        for (upper, lower) in row.chunks_exact(4).zip(below.chunks_exact(4)) {
            sampled += 1;
            if (intensity(upper) - intensity(lower)).unsigned_abs() > edge_threshold as u32 {
                edges += 1;
            }
        }
    }

    let edge_density = (edges as f64 / sampled as f64) as f32;
    TextureMetrics {
        edge_density,
        uniformity: 1.0 - edge_density,
    }
}

/// Coarse shape cues derived from the color distribution.
pub fn analyze_shape(color: &ColorDistribution) -> ShapeFeatures {
    ShapeFeatures {
        spot_patterns: color.spotting > shape::SPOT_PATTERN_MIN,
        leaf_integrity: color.healthy > shape::LEAF_INTEGRITY_MIN,
        discoloration: color.yellowing + color.browning,
    }
}
