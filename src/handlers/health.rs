// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Service liveness plus whether municipality boundaries are loaded

use crate::services::MapController;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(controller: web::Data<MapController>) -> impl Responder {
    let boundaries = controller.boundary_status().await;

    HttpResponse::Ok().json(json!({
        "status": if boundaries.loaded { "ok" } else { "degraded" },
        "service": "agro-territory-map",
        "version": env!("CARGO_PKG_VERSION"),
        "boundaries": boundaries
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
