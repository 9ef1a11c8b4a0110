// src/services/geo_distance.rs
// DOCUMENTATION: Great-circle distance and radius filtering
// PURPOSE: Haversine distance between lat/lng points, plus the centroid
// approximation used to decide whether a municipality falls inside a radius

use crate::models::{GeoPoint, RadiusSelection};
use geo_types::{Coord, LineString};
use geojson::{Feature, Geometry, PolygonType, Value};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub struct GeoDistance;

impl GeoDistance {
    /// Haversine distance in kilometers
    /// DOCUMENTATION: Pure and symmetric. Non-finite input propagates to the result;
    /// callers validate coordinates first.
    pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
        let d_lat = (b.lat - a.lat).to_radians();
        let d_lng = (b.lng - a.lng).to_radians();

        let h = (d_lat / 2.0).sin().powi(2)
            + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Approximate center of a municipality polygon
    ///
    /// Unweighted mean of the vertices of the first ring (the first ring of the
    /// first polygon for MultiPolygon). This is not an area centroid: concave or
    /// very large shapes can land off-center. Other geometry types yield None.
    pub fn approximate_centroid(geometry: &Geometry) -> Option<GeoPoint> {
        let ring = match &geometry.value {
            Value::Polygon(rings) => first_ring(rings)?,
            Value::MultiPolygon(polygons) => first_ring(polygons.first()?)?,
            _ => return None,
        };

        let count = ring.coords().count();
        if count == 0 {
            return None;
        }

        let (sum_x, sum_y) = ring
            .coords()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));

        Some(GeoPoint {
            lat: sum_y / count as f64,
            lng: sum_x / count as f64,
        })
    }

    /// Whether the feature's approximate centroid lies within the selection
    pub fn feature_within_radius(feature: &Feature, selection: &RadiusSelection) -> bool {
        feature
            .geometry
            .as_ref()
            .and_then(Self::approximate_centroid)
            .map(|centroid| Self::haversine_km(selection.center, centroid) <= selection.radius_km)
            .unwrap_or(false)
    }

    /// Keep the features inside the radius, preserving order
    pub fn filter_within_radius<'a, I>(features: I, selection: &RadiusSelection) -> Vec<&'a Feature>
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        features
            .into_iter()
            .filter(|feature| Self::feature_within_radius(feature, selection))
            .collect()
    }
}

fn first_ring(rings: &PolygonType) -> Option<LineString<f64>> {
    let ring = rings.first()?;
    Some(
        ring.iter()
            .filter(|position| position.len() >= 2)
            .map(|position| Coord {
                x: position[0],
                y: position[1],
            })
            .collect(),
    )
}
