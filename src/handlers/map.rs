// src/handlers/map.rs
// DOCUMENTATION: Map state handlers
// PURPOSE: Filters, settings, active layers and the combined legend

use crate::config::Config;
use crate::errors::MapError;
use crate::models::{
    GeoPoint, RadiusRequest, RadiusSelection, SettingsRequest, StateFilterRequest,
    VisibilityRequest,
};
use crate::services::MapController;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// GET /map/state
pub async fn map_state(controller: web::Data<MapController>) -> impl Responder {
    HttpResponse::Ok().json(controller.snapshot().await)
}

/// PUT /map/settings
pub async fn update_settings(
    controller: web::Data<MapController>,
    body: web::Json<SettingsRequest>,
) -> Result<impl Responder, MapError> {
    body.validate()?;
    let snapshot = controller
        .update_settings(body.base_color.as_deref(), body.opacity)
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// PUT /map/state-filter
/// Set (or clear with `null`) the UF filter; returns the re-rendered crop layer
pub async fn set_state_filter(
    controller: web::Data<MapController>,
    body: web::Json<StateFilterRequest>,
) -> Result<impl Responder, MapError> {
    body.validate()?;
    let layer = controller.set_state_filter(body.state.as_deref()).await?;
    let snapshot = controller.snapshot().await;

    Ok(HttpResponse::Ok().json(json!({
        "state_filter": snapshot.state_filter,
        "layer": layer
    })))
}

/// POST /map/radius
pub async fn set_radius(
    controller: web::Data<MapController>,
    config: web::Data<Config>,
    body: web::Json<RadiusRequest>,
) -> Result<impl Responder, MapError> {
    body.validate()?;

    let selection = RadiusSelection {
        center: GeoPoint::new(body.lat, body.lng),
        radius_km: body.radius_km.unwrap_or(config.default_radius_km),
    };
    let layer = controller.set_radius(selection).await?;

    Ok(HttpResponse::Ok().json(json!({
        "radius": selection,
        "layer": layer
    })))
}

/// DELETE /map/radius
pub async fn clear_radius(controller: web::Data<MapController>) -> Result<impl Responder, MapError> {
    let layer = controller.clear_radius().await?;

    Ok(HttpResponse::Ok().json(json!({
        "radius": null,
        "layer": layer
    })))
}

/// GET /map/legend
/// Combined legend of the visible layers; 204 when nothing is visible
pub async fn combined_legend(
    controller: web::Data<MapController>,
) -> Result<impl Responder, MapError> {
    Ok(match controller.combined_legend().await? {
        Some(legend) => HttpResponse::Ok().json(legend),
        None => HttpResponse::NoContent().finish(),
    })
}

/// GET /map/layers
pub async fn list_layers(controller: web::Data<MapController>) -> impl Responder {
    let layers = controller.list_layers().await;
    HttpResponse::Ok().json(json!({
        "total": layers.len(),
        "layers": layers
    }))
}

/// PUT /map/layers/{id}/visibility
pub async fn set_layer_visibility(
    controller: web::Data<MapController>,
    path: web::Path<Uuid>,
    body: web::Json<VisibilityRequest>,
) -> Result<impl Responder, MapError> {
    let layer = controller
        .set_layer_visibility(path.into_inner(), body.visible)
        .await?;
    Ok(HttpResponse::Ok().json(layer))
}

/// DELETE /map/layers/{id}
pub async fn remove_layer(
    controller: web::Data<MapController>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MapError> {
    controller.remove_layer(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for map routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/map")
            .route("/state", web::get().to(map_state))
            .route("/settings", web::put().to(update_settings))
            .route("/state-filter", web::put().to(set_state_filter))
            .route("/radius", web::post().to(set_radius))
            .route("/radius", web::delete().to(clear_radius))
            .route("/legend", web::get().to(combined_legend))
            .route("/layers", web::get().to(list_layers))
            .route("/layers/{id}/visibility", web::put().to(set_layer_visibility))
            .route("/layers/{id}", web::delete().to(remove_layer)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LayerQuery;
    use crate::services::map_controller::fixtures;
    use actix_web::{http::StatusCode, test, App};

    #[actix_rt::test]
    async fn test_radius_and_state_filter_round_trip() {
        let controller = web::Data::new(fixtures::controller_with_boundaries().await);
        controller
            .apply_crop_data(
                "Soja",
                None,
                fixtures::dataset(&[("3550308", 100.0)]),
                &LayerQuery::default(),
            )
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(controller.clone())
                .app_data(web::Data::new(Config::test_defaults()))
                .configure(config),
        )
        .await;

        // default radius (50km) around São Paulo
        let req = test::TestRequest::post()
            .uri("/map/radius")
            .set_json(json!({"lat": -23.5505, "lng": -46.6333}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["radius"]["radius_km"], 50.0);
        assert_eq!(body["layer"]["feature_count"], 2);

        let req = test::TestRequest::put()
            .uri("/map/state-filter")
            .set_json(json!({"state": "rj"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state_filter"], "RJ");
        assert_eq!(body["layer"]["feature_count"], 0);

        let req = test::TestRequest::delete().uri("/map/radius").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["layer"]["feature_count"], 1);

        let req = test::TestRequest::get().uri("/map/state").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state_filter"], "RJ");
        assert_eq!(body["radius"], serde_json::Value::Null);
        assert_eq!(body["current_crop"], "Soja");
    }

    #[actix_rt::test]
    async fn test_state_filter_echoes_stored_value() {
        let controller = web::Data::new(fixtures::controller_with_boundaries().await);
        let app = test::init_service(
            App::new()
                .app_data(controller.clone())
                .app_data(web::Data::new(Config::test_defaults()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/map/state-filter")
            .set_json(json!({"state": "mt"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state_filter"], "MT");
        assert_eq!(body["layer"], serde_json::Value::Null);
        assert_eq!(controller.snapshot().await.state_filter.as_deref(), Some("MT"));

        let req = test::TestRequest::put()
            .uri("/map/state-filter")
            .set_json(json!({"state": null}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state_filter"], serde_json::Value::Null);
        assert!(controller.snapshot().await.state_filter.is_none());

        let req = test::TestRequest::put()
            .uri("/map/state-filter")
            .set_json(json!({"state": " sp"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_layer_lifecycle() {
        let controller = web::Data::new(fixtures::controller_with_boundaries().await);
        let layer = controller
            .apply_metric_data(
                "Herbicidas",
                fixtures::dataset(&[("3550308", 5000.0)]),
                &LayerQuery::default(),
            )
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(controller.clone())
                .app_data(web::Data::new(Config::test_defaults()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/map/legend").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "Camadas Ativas");

        let req = test::TestRequest::put()
            .uri(&format!("/map/layers/{}/visibility", layer.id))
            .set_json(json!({"visible": false}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["visible"], false);

        let req = test::TestRequest::get().uri("/map/legend").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/map/layers/{}", layer.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/map/layers/{}", layer.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/map/layers").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 0);
    }

    #[actix_rt::test]
    async fn test_settings_validation() {
        let controller = web::Data::new(fixtures::controller_with_boundaries().await);
        let app = test::init_service(
            App::new()
                .app_data(controller)
                .app_data(web::Data::new(Config::test_defaults()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/map/settings")
            .set_json(json!({"opacity": 2.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/map/settings")
            .set_json(json!({"base_color": "#FF5722", "opacity": 0.4}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["base_color"], "#ff5722");
        assert_eq!(body["opacity"], 0.4);
    }
}
