// src/services/color_scale.rs
// DOCUMENTATION: Value-to-color mapping for choropleth layers
// PURPOSE: Logarithmic normalization of heavy-tailed metrics onto a sequential
// lightness ramp of a single base hue

use crate::errors::MapError;
use crate::models::{Hsl, Rgb, ValueRange};

/// Fill color for municipalities without data; never produced by the scale
pub const NO_DATA_COLOR: &str = "#e8e8e8";

/// Lightness (percent) at the bottom of the range
const LIGHTNESS_LOW_VALUE: f64 = 85.0;
/// Lightness drop from bottom to top of the range
const LIGHTNESS_SPAN: f64 = 70.0;
const SATURATION_FLOOR: f64 = 20.0;
const SATURATION_DROP: f64 = 10.0;

/// Sequential color scale
/// DOCUMENTATION: Higher values map to darker shades of the base hue.
/// Monotonic and continuous in the value for a fixed range and base color.
pub struct ColorScale;

impl ColorScale {
    /// Position of `value` on the logarithmic scale of `range`, in [0, 1]
    ///
    /// Values <= 0 (and NaN) are treated as 1. The range is widened so that
    /// min >= 1 and max >= 10 * min, which keeps the log span non-zero.
    /// The result is clamped to [0, 1]; values above the range saturate.
    pub fn normalize(value: f64, range: ValueRange) -> f64 {
        let value = if value.is_nan() || value <= 0.0 { 1.0 } else { value };
        let (adjusted_min, adjusted_max) = range.adjusted();

        let log_min = adjusted_min.ln();
        let log_max = adjusted_max.ln();
        let log_value = value.max(adjusted_min).ln();

        ((log_value - log_min) / (log_max - log_min)).clamp(0.0, 1.0)
    }

    /// Shade of `base` at scale position `t`
    /// DOCUMENTATION: Hue is kept. Lightness runs from 85% at t=0 to 15% at t=1,
    /// saturation drops by up to 10 points but never below 20%.
    pub fn sequential_color(t: f64, base: Rgb) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let base_hsl = Hsl::from(base);

        let lightness = LIGHTNESS_LOW_VALUE - t * LIGHTNESS_SPAN;
        let saturation = (base_hsl.s - t * SATURATION_DROP).max(SATURATION_FLOOR);

        Rgb::from(Hsl {
            h: base_hsl.h,
            s: saturation,
            l: lightness,
        })
    }

    pub fn color_for_value(value: f64, range: ValueRange, base: Rgb) -> Rgb {
        Self::sequential_color(Self::normalize(value, range), base)
    }

    /// String-in, string-out variant used by the HTTP surface
    /// DOCUMENTATION: Fails fast with InvalidColorFormat when `base_color` is not `#rrggbb`
    pub fn color_for_value_hex(
        value: f64,
        min: f64,
        max: f64,
        base_color: &str,
    ) -> Result<String, MapError> {
        let base = Rgb::from_hex(base_color)?;
        Ok(Self::color_for_value(value, ValueRange::new(min, max), base).to_hex())
    }
}
