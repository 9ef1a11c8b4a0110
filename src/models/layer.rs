// src/models/layer.rs
// DOCUMENTATION: Rendered layer structures returned to the map client
// PURPOSE: Feature styles, popups, legends and the layer envelope

use super::{TerritoryKind, TerritorySummary, ValueRange};
use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a layer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Harvested hectares of one crop
    Crop,
    /// Generic numeric metric (revenue categories)
    Metric,
    Revenda,
    Vendedor,
}

impl From<TerritoryKind> for LayerKind {
    fn from(kind: TerritoryKind) -> Self {
        match kind {
            TerritoryKind::Revenda => LayerKind::Revenda,
            TerritoryKind::Vendedor => LayerKind::Vendedor,
        }
    }
}

/// Path style in the mapping library's vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: f64,
    pub opacity: f64,
    /// Border color
    pub color: String,
    /// Marker radius in pixels, only for point features
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub radius: Option<f64>,
}

/// Popup content: a bold title and plain lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: String,
    pub value: Option<f64>,
    pub label: String,
}

/// One color ramp inside a legend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSection {
    /// Layer name (combined legends only)
    pub title: Option<String>,
    /// Quantity being shown, e.g. "Hectares Colhidos"
    pub subtitle: String,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    /// Extra line such as the active radius
    pub note: Option<String>,
    pub sections: Vec<LegendSection>,
    pub no_data: LegendEntry,
}

/// A layer registered on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveLayer {
    pub id: Uuid,
    pub name: String,
    pub kind: LayerKind,
    /// Base color of the ramp, or the border color of a territory
    pub color: String,
    pub range: ValueRange,
    pub unit: Option<String>,
    pub visible: bool,
    pub feature_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Ready-to-render layer
/// DOCUMENTATION: Every feature carries `style`, `popup`, `municipality_code`
/// and `value` properties so the client only binds them.
#[derive(Debug, Clone, Serialize)]
pub struct StyledLayer {
    pub id: Uuid,
    pub name: String,
    pub kind: LayerKind,
    pub color: String,
    pub range: ValueRange,
    pub unit: Option<String>,
    /// Crop name actually served when the backend matched by similarity
    pub matched_name: Option<String>,
    /// True when rendered from the demonstration markers instead of boundaries
    pub fallback: bool,
    pub feature_count: usize,
    /// [min_lng, min_lat, max_lng, max_lat]
    pub bounds: [f64; 4],
    pub legend: Option<Legend>,
    pub analytics: Option<TerritorySummary>,
    pub features: FeatureCollection,
    pub generated_at: DateTime<Utc>,
}

impl StyledLayer {
    pub fn to_active_layer(&self) -> ActiveLayer {
        ActiveLayer {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            color: self.color.clone(),
            range: self.range,
            unit: self.unit.clone(),
            visible: true,
            feature_count: self.feature_count,
            created_at: self.generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_uses_mapping_library_names() {
        let style = FeatureStyle {
            fill_color: "#e8e8e8".to_string(),
            fill_opacity: 0.6,
            weight: 0.3,
            opacity: 0.8,
            color: "#cccccc".to_string(),
            radius: None,
        };
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#e8e8e8");
        assert_eq!(json["fillOpacity"], 0.6);
        assert!(json.get("radius").is_none());
    }

    #[test]
    fn test_territory_kind_maps_to_layer_kind() {
        assert_eq!(LayerKind::from(TerritoryKind::Revenda), LayerKind::Revenda);
        assert_eq!(
            serde_json::to_value(LayerKind::Vendedor).unwrap(),
            serde_json::json!("vendedor")
        );
    }
}
