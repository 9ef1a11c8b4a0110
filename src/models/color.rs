// src/models/color.rs
// DOCUMENTATION: Color and value-range types used by the color scale
// PURPOSE: RGB/HSL representations and the observed range of a metric

use crate::errors::MapError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color with 8-bit channels
/// DOCUMENTATION: Parsed from and formatted to `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6-digit hex color, with or without the leading `#`
    /// DOCUMENTATION: Case-insensitive. Short forms (`#abc`) and named colors are rejected.
    pub fn from_hex(raw: &str) -> Result<Self, MapError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MapError::InvalidColorFormat(raw.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| MapError::InvalidColorFormat(raw.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// HSL color: hue in degrees [0, 360), saturation and lightness in percent [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = f64::from(rgb.r) / 255.0;
        let g = f64::from(rgb.g) / 255.0;
        let b = f64::from(rgb.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            // achromatic
            return Hsl { h: 0.0, s: 0.0, l: l * 100.0 };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsl {
            h: h / 6.0 * 360.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }
}

impl From<Hsl> for Rgb {
    fn from(hsl: Hsl) -> Self {
        let h = hsl.h / 360.0;
        let s = (hsl.s / 100.0).clamp(0.0, 1.0);
        let l = (hsl.l / 100.0).clamp(0.0, 1.0);

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_channel(p, q, h + 1.0 / 3.0),
                hue_to_channel(p, q, h),
                hue_to_channel(p, q, h - 1.0 / 3.0),
            )
        };

        Rgb {
            r: to_channel(r),
            g: to_channel(g),
            b: to_channel(b),
        }
    }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn to_channel(unit: f64) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Observed minimum/maximum of a metric across a dataset
/// DOCUMENTATION: Invariant min <= max. Degenerate ranges are widened by the color scale,
/// never divided by directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    /// Range used when a dataset has no positive values
    fn default() -> Self {
        Self { min: 0.0, max: 1000.0 }
    }
}

impl ValueRange {
    /// Fixed range for territory layers, every municipality is drawn the same
    pub const TERRITORY: ValueRange = ValueRange { min: 1.0, max: 1.0 };

    /// Build a range, swapping the bounds if they arrive reversed
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Range over the strictly positive, finite values of a dataset
    /// DOCUMENTATION: Zero means "no data" on the map, so it never widens the range.
    /// Falls back to `{0, 1000}` when nothing qualifies.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut bounds: Option<(f64, f64)> = None;

        for value in values.into_iter().filter(|v| v.is_finite() && *v > 0.0) {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
        }

        bounds
            .map(|(min, max)| Self { min, max })
            .unwrap_or_default()
    }

    /// Bounds actually used for logarithmic scaling
    /// DOCUMENTATION: min is at least 1 and max at least ten times min,
    /// so the log span is never zero.
    pub fn adjusted(&self) -> (f64, f64) {
        let adjusted_min = self.min.max(1.0);
        let adjusted_max = self.max.max(adjusted_min * 10.0);
        (adjusted_min, adjusted_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#4CAF50").unwrap(), Rgb::new(76, 175, 80));
        assert_eq!(Rgb::from_hex("4caf50").unwrap(), Rgb::new(76, 175, 80));
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        for raw in ["", "#", "#abc", "#4CAF5", "#4CAF500", "green", "#GGGGGG", "#4CAF5é"] {
            assert!(
                matches!(Rgb::from_hex(raw), Err(MapError::InvalidColorFormat(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_hex_is_lowercase() {
        assert_eq!(Rgb::new(255, 87, 34).to_hex(), "#ff5722");
        assert_eq!(Rgb::new(0, 0, 0).to_string(), "#000000");
    }

    #[test]
    fn test_rgb_to_hsl_known_values() {
        let hsl = Hsl::from(Rgb::new(255, 0, 0));
        assert!((hsl.h - 0.0).abs() < 1e-9);
        assert!((hsl.s - 100.0).abs() < 1e-9);
        assert!((hsl.l - 50.0).abs() < 1e-9);

        let gray = Hsl::from(Rgb::new(128, 128, 128));
        assert_eq!(gray.s, 0.0);
        assert_eq!(gray.h, 0.0);
    }

    #[test]
    fn test_hsl_round_trip_within_one() {
        let samples = [
            Rgb::new(76, 175, 80),
            Rgb::new(33, 150, 243),
            Rgb::new(255, 87, 34),
            Rgb::new(0, 0, 0),
            Rgb::new(255, 255, 255),
            Rgb::new(12, 200, 7),
            Rgb::new(200, 12, 180),
            Rgb::new(128, 128, 128),
        ];

        for rgb in samples {
            let back = Rgb::from(Hsl::from(rgb));
            assert!((i16::from(back.r) - i16::from(rgb.r)).abs() <= 1, "{rgb} -> {back}");
            assert!((i16::from(back.g) - i16::from(rgb.g)).abs() <= 1, "{rgb} -> {back}");
            assert!((i16::from(back.b) - i16::from(rgb.b)).abs() <= 1, "{rgb} -> {back}");
        }
    }

    #[test]
    fn test_range_from_values_ignores_non_positive() {
        let range = ValueRange::from_values([0.0, -3.0, 12.5, 400.0, f64::NAN, 7.0]);
        assert_eq!(range, ValueRange { min: 7.0, max: 400.0 });
    }

    #[test]
    fn test_range_from_values_defaults_when_empty() {
        assert_eq!(ValueRange::from_values([0.0, 0.0]), ValueRange::default());
        assert_eq!(ValueRange::from_values(Vec::new()), ValueRange { min: 0.0, max: 1000.0 });
    }

    #[test]
    fn test_range_new_swaps_reversed_bounds() {
        assert_eq!(ValueRange::new(10.0, 2.0), ValueRange { min: 2.0, max: 10.0 });
    }

    #[test]
    fn test_adjusted_widens_degenerate_range() {
        assert_eq!(ValueRange::new(10.0, 10.0).adjusted(), (10.0, 100.0));
        assert_eq!(ValueRange::new(0.0, 0.0).adjusted(), (1.0, 10.0));
        assert_eq!(ValueRange::new(-5.0, -1.0).adjusted(), (1.0, 10.0));
        assert_eq!(ValueRange::new(100.0, 5000.0).adjusted(), (100.0, 5000.0));
    }
}
