// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for boundary management
// PURPOSE: Reload the municipality GeoJSON and inspect what is loaded

use crate::config::Config;
use crate::errors::MapError;
use crate::services::MapController;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

/// POST /admin/boundaries/reload
/// Reload municipality boundaries from the configured paths
///
/// DOCUMENTATION: Requires admin authentication via X-Admin-Token header.
/// When every path fails the previous boundaries are kept and 503 is returned.
pub async fn reload_boundaries(
    controller: web::Data<MapController>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, MapError> {
    verify_admin_token(&req, &config)?;

    log::info!("Admin boundary reload requested");
    let status = controller.reload_boundaries().await?;

    log::info!(
        "Boundaries reloaded from {:?}: {} features",
        status.source,
        status.feature_count
    );
    Ok(HttpResponse::Ok().json(status))
}

/// GET /admin/status
/// Boundary source, feature count and configured paths
pub async fn admin_status(
    controller: web::Data<MapController>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, MapError> {
    verify_admin_token(&req, &config)?;

    let snapshot = controller.snapshot().await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Map service operational",
        "environment": config.environment,
        "backend_base_url": config.backend_base_url,
        "boundary_paths": controller.boundary_paths(),
        "boundaries": snapshot.boundaries,
        "active_layers": snapshot.active_layers.len(),
        "current_crop": snapshot.current_crop
    })))
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), MapError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            MapError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(MapError::Forbidden);
    }

    Ok(())
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/boundaries/reload", web::post().to(reload_boundaries))
            .route("/status", web::get().to(admin_status)),
    );
}
