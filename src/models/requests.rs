// src/models/requests.rs
// DOCUMENTATION: Request DTOs for the HTTP surface
// PURPOSE: Query and body shapes with their validation rules

use serde::{Deserialize, Serialize};
use validator::Validate;

/// GET /scale/color
#[derive(Debug, Deserialize)]
pub struct ColorQuery {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// `#rrggbb`; defaults to the configured base color
    pub base_color: Option<String>,
}

/// GET /scale/legend
#[derive(Debug, Deserialize, Validate)]
pub struct LegendQuery {
    pub min: f64,
    pub max: f64,
    pub base_color: Option<String>,
    #[validate(range(min = 2, max = 12))]
    pub steps: Option<usize>,
    pub unit: Option<String>,
    pub title: Option<String>,
}

/// GET /geo/distance
#[derive(Debug, Deserialize, Validate)]
pub struct DistanceQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat1: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng1: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat2: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng2: f64,
}

/// Options shared by crop and metric layer requests
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LayerQuery {
    /// UF filter for this layer only; falls back to the map-wide filter
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    pub base_color: Option<String>,
    #[validate(length(max = 32))]
    pub unit: Option<String>,
    /// Display name; defaults to the category
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
}

/// POST /layers/territories
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TerritoryLayerRequest {
    #[serde(default)]
    pub revendas: Vec<i64>,
    #[serde(default)]
    pub vendedores: Vec<i64>,
}

impl TerritoryLayerRequest {
    pub fn is_empty(&self) -> bool {
        self.revendas.is_empty() && self.vendedores.is_empty()
    }
}

/// POST /map/radius
#[derive(Debug, Deserialize, Validate)]
pub struct RadiusRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Defaults to DEFAULT_RADIUS_KM
    #[validate(range(min = 0.1, max = 5000.0))]
    pub radius_km: Option<f64>,
}

/// PUT /map/settings
#[derive(Debug, Deserialize, Validate)]
pub struct SettingsRequest {
    pub base_color: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub opacity: Option<f64>,
}

/// PUT /map/state-filter
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct StateFilterRequest {
    /// Two-letter UF; `null` clears the filter
    #[validate(length(equal = 2))]
    pub state: Option<String>,
}

/// PUT /map/layers/{id}/visibility
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}
