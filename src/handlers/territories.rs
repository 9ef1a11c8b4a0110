// src/handlers/territories.rs
// DOCUMENTATION: Territory listing handlers
// PURPOSE: Pass revendas/vendedores through from the backend for the selection UI

use crate::errors::MapError;
use crate::models::TerritoryKind;
use crate::services::MapController;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

async fn list(controller: &MapController, kind: TerritoryKind) -> Result<HttpResponse, MapError> {
    let entities = controller.list_entities(kind).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "kind": kind,
        "total": entities.len(),
        "items": entities
    })))
}

/// GET /territories/revendas
pub async fn list_revendas(controller: web::Data<MapController>) -> Result<impl Responder, MapError> {
    list(&controller, TerritoryKind::Revenda).await
}

/// GET /territories/vendedores
pub async fn list_vendedores(
    controller: web::Data<MapController>,
) -> Result<impl Responder, MapError> {
    list(&controller, TerritoryKind::Vendedor).await
}

/// Configuration for territory routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/territories")
            .route("/revendas", web::get().to(list_revendas))
            .route("/vendedores", web::get().to(list_vendedores)),
    );
}
