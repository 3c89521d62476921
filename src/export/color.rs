//! Distance-to-color mapping.

use crate::types::Color;

/// Distance at which color intensity saturates, in map units.
pub const DEFAULT_MAX_DISTANCE: f32 = 0.5;

/// Map a signed distance to a color.
///
/// Negative distances (inside) are red and positive distances (outside) are
/// blue, scaling linearly to full intensity at `max_distance` and saturating
/// beyond it. Zero and NaN map to black.
pub fn distance_to_color(distance: f32, max_distance: f32) -> Color {
    if distance < 0.0 {
        [saturate(-distance / max_distance * 255.0), 0, 0]
    } else if distance > 0.0 {
        [0, 0, saturate(distance / max_distance * 255.0)]
    } else {
        [0, 0, 0]
    }
}

/// Clamp an intensity to `[0, 255]`, truncating the fractional part.
fn saturate(intensity: f32) -> u8 {
    if intensity.is_nan() {
        return 0;
    }
    intensity.clamp(0.0, 255.0) as u8
}
