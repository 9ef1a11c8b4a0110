// src/handlers/scale.rs
// DOCUMENTATION: Color scale and distance handlers
// PURPOSE: Expose ColorScale, legends and the haversine distance over HTTP

use crate::config::Config;
use crate::errors::MapError;
use crate::models::{ColorQuery, DistanceQuery, GeoPoint, LegendQuery, Rgb, ValueRange};
use crate::services::{ColorScale, GeoDistance, LegendBuilder, CROP_LEGEND_STEPS};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// GET /scale/color
/// Color of one value on the sequential scale
pub async fn scale_color(
    config: web::Data<Config>,
    query: web::Query<ColorQuery>,
) -> Result<impl Responder, MapError> {
    let base_color = query
        .base_color
        .as_deref()
        .unwrap_or(&config.default_base_color);
    let color = ColorScale::color_for_value_hex(query.value, query.min, query.max, base_color)?;
    let range = ValueRange::new(query.min, query.max);

    Ok(HttpResponse::Ok().json(json!({
        "value": query.value,
        "range": range,
        "normalized": ColorScale::normalize(query.value, range),
        "base_color": base_color,
        "color": color
    })))
}

/// GET /scale/legend
/// Legend steps for a range
pub async fn scale_legend(
    config: web::Data<Config>,
    query: web::Query<LegendQuery>,
) -> Result<impl Responder, MapError> {
    query.validate()?;

    let base = Rgb::from_hex(
        query
            .base_color
            .as_deref()
            .unwrap_or(&config.default_base_color),
    )?;
    let legend = LegendBuilder::single(
        query.title.as_deref().unwrap_or("Legenda"),
        ValueRange::new(query.min, query.max),
        base,
        query.steps.unwrap_or(CROP_LEGEND_STEPS),
        query.unit.as_deref(),
    );

    Ok(HttpResponse::Ok().json(legend))
}

/// GET /geo/distance
/// Great-circle distance between two points, in kilometers
pub async fn geo_distance(query: web::Query<DistanceQuery>) -> Result<impl Responder, MapError> {
    query.validate()?;

    let from = GeoPoint::new(query.lat1, query.lng1);
    let to = GeoPoint::new(query.lat2, query.lng2);

    Ok(HttpResponse::Ok().json(json!({
        "from": from,
        "to": to,
        "distance_km": GeoDistance::haversine_km(from, to)
    })))
}

/// Configuration for scale and distance routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/scale")
            .route("/color", web::get().to(scale_color))
            .route("/legend", web::get().to(scale_legend)),
    )
    .route("/geo/distance", web::get().to(geo_distance));
}
