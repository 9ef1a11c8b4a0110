// src/handlers/layers.rs
// DOCUMENTATION: Layer construction handlers
// PURPOSE: Build crop, revenue and territory layers from backend data

use crate::errors::MapError;
use crate::models::{LayerQuery, TerritoryLayerRequest};
use crate::services::MapController;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// GET /layers/crop/{crop}
/// Crop layer with the state and radius filters applied
pub async fn crop_layer(
    controller: web::Data<MapController>,
    path: web::Path<String>,
    query: web::Query<LayerQuery>,
) -> Result<impl Responder, MapError> {
    query.validate()?;
    let crop = path.into_inner();

    log::info!("Crop layer requested: {}", crop);
    let layer = controller.load_crop_layer(&crop, &query).await?;
    Ok(HttpResponse::Ok().json(layer))
}

/// GET /layers/metric/{category}
/// Revenue layer, registered as an active layer
pub async fn metric_layer(
    controller: web::Data<MapController>,
    path: web::Path<String>,
    query: web::Query<LayerQuery>,
) -> Result<impl Responder, MapError> {
    query.validate()?;
    let category = path.into_inner();

    log::info!("Metric layer requested: {}", category);
    let layer = controller.load_metric_layer(&category, &query).await?;
    Ok(HttpResponse::Created().json(layer))
}

/// POST /layers/territories
/// One outline layer per selected revenda/vendedor
pub async fn territory_layers(
    controller: web::Data<MapController>,
    body: web::Json<TerritoryLayerRequest>,
) -> Result<impl Responder, MapError> {
    body.validate()?;

    log::info!(
        "Territory layers requested: {} revendas, {} vendedores",
        body.revendas.len(),
        body.vendedores.len()
    );
    let layers = controller.load_territory_layers(&body).await?;

    Ok(HttpResponse::Created().json(json!({
        "count": layers.len(),
        "layers": layers
    })))
}

/// Configuration for layer routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/layers")
            .route("/crop/{crop}", web::get().to(crop_layer))
            .route("/metric/{category}", web::get().to(metric_layer))
            .route("/territories", web::post().to(territory_layers)),
    );
}
