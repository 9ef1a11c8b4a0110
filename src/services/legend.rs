// src/services/legend.rs
// DOCUMENTATION: Legend construction and pt-BR number formatting
// PURPOSE: Turn a value range and base color into labelled color steps

use crate::models::{ActiveLayer, Legend, LegendEntry, LegendSection, Rgb, ValueRange};
use crate::services::color_scale::{ColorScale, NO_DATA_COLOR};
use crate::errors::MapError;

/// Steps in a single-layer (crop) legend
pub const CROP_LEGEND_STEPS: usize = 6;
/// Steps per layer in the combined legend
pub const COMBINED_LEGEND_STEPS: usize = 4;

pub struct LegendBuilder;

impl LegendBuilder {
    /// Values shown in the legend, spaced evenly on the log scale
    /// DOCUMENTATION: First and last are exactly the adjusted min/max of the range
    pub fn step_values(range: ValueRange, steps: usize) -> Vec<f64> {
        let (adjusted_min, adjusted_max) = range.adjusted();
        if steps < 2 {
            return vec![adjusted_min];
        }

        let log_min = adjusted_min.ln();
        let log_max = adjusted_max.ln();

        (0..steps)
            .map(|i| {
                if i == 0 {
                    adjusted_min
                } else if i == steps - 1 {
                    adjusted_max
                } else {
                    (log_min + (log_max - log_min) * (i as f64 / (steps - 1) as f64)).exp()
                }
            })
            .collect()
    }

    pub fn entries(range: ValueRange, base: Rgb, steps: usize, unit: &str) -> Vec<LegendEntry> {
        Self::step_values(range, steps)
            .into_iter()
            .map(|value| LegendEntry {
                color: ColorScale::color_for_value(value, range, base).to_hex(),
                value: Some(value),
                label: format!("{} {}", format_legend_value(value), unit)
                    .trim_end()
                    .to_string(),
            })
            .collect()
    }

    pub fn no_data_entry() -> LegendEntry {
        LegendEntry {
            color: NO_DATA_COLOR.to_string(),
            value: None,
            label: "Sem dados".to_string(),
        }
    }

    /// Legend of the crop layer (hectares, 6 steps)
    pub fn crop_legend(
        crop_name: &str,
        range: ValueRange,
        base: Rgb,
        radius_note: Option<String>,
    ) -> Legend {
        Legend {
            title: crop_name.to_string(),
            note: radius_note,
            sections: vec![LegendSection {
                title: None,
                subtitle: "Hectares Colhidos".to_string(),
                entries: Self::entries(range, base, CROP_LEGEND_STEPS, "ha"),
            }],
            no_data: Self::no_data_entry(),
        }
    }

    /// Free-form single-section legend (used by /scale/legend and metric layers)
    pub fn single(
        title: &str,
        range: ValueRange,
        base: Rgb,
        steps: usize,
        unit: Option<&str>,
    ) -> Legend {
        Legend {
            title: title.to_string(),
            note: None,
            sections: vec![LegendSection {
                title: None,
                subtitle: unit.unwrap_or("Valor").to_string(),
                entries: Self::entries(range, base, steps, unit.unwrap_or("")),
            }],
            no_data: Self::no_data_entry(),
        }
    }

    /// One section per visible layer, or None when nothing is visible
    pub fn combined(layers: &[ActiveLayer]) -> Result<Option<Legend>, MapError> {
        let sections = layers
            .iter()
            .filter(|layer| layer.visible)
            .map(|layer| {
                let base = Rgb::from_hex(&layer.color)?;
                let unit = layer.unit.as_deref();
                Ok(LegendSection {
                    title: Some(layer.name.clone()),
                    subtitle: unit.unwrap_or("Valor").to_string(),
                    entries: Self::entries(
                        layer.range,
                        base,
                        COMBINED_LEGEND_STEPS,
                        unit.unwrap_or(""),
                    ),
                })
            })
            .collect::<Result<Vec<_>, MapError>>()?;

        if sections.is_empty() {
            return Ok(None);
        }

        Ok(Some(Legend {
            title: "Camadas Ativas".to_string(),
            note: None,
            sections,
            no_data: Self::no_data_entry(),
        }))
    }

    /// "Raio: 50km (12 municípios)"
    pub fn radius_note(radius_km: f64, municipality_count: usize) -> String {
        format!(
            "Raio: {}km ({} municípios)",
            format_pt_br(radius_km, 1),
            municipality_count
        )
    }
}

/// Legend label: integers below 1000, thousands as "1,5k"
pub fn format_legend_value(value: f64) -> String {
    if value < 1000.0 {
        format_pt_br(value, 0)
    } else {
        format!("{}k", format_pt_br(value / 1000.0, 1))
    }
}

/// Brazilian number formatting: `.` groups thousands, `,` separates decimals,
/// at most `max_fraction_digits` decimals with trailing zeros dropped
pub fn format_pt_br(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (formatted.as_str(), ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}
