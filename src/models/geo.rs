// src/models/geo.rs
// DOCUMENTATION: Geographic point types
// PURPOSE: Lat/lng points and the radius selection made on the map

use serde::{Deserialize, Serialize};

/// Point in decimal degrees (WGS84 assumed)
/// DOCUMENTATION: No range validation here; request DTOs validate coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Center and radius chosen for the radius filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusSelection {
    pub center: GeoPoint,
    pub radius_km: f64,
}
