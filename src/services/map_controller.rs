// src/services/map_controller.rs
// DOCUMENTATION: Map application state
// PURPOSE: Owns the loaded boundaries, the backend client and the map state
// (base color, opacity, filters, current crop, active layers) and turns
// backend datasets into styled layers

use crate::config::Config;
use crate::errors::MapError;
use crate::models::{
    ActiveLayer, LayerKind, LayerQuery, Legend, MunicipalityRef, RadiusSelection, Rgb,
    StyledLayer, TerritoryEntity, TerritoryKind, TerritoryLayerRequest, TerritoryPayload,
    ValueRange,
};
use crate::services::analytics::TerritoryAnalytics;
use crate::services::backend_client::{BackendClient, MunicipalityDataset};
use crate::services::boundary_loader::{BoundaryLoader, MunicipalityBoundaries};
use crate::services::geo_distance::GeoDistance;
use crate::services::layer_builder::{LayerBuilder, FALLBACK_RANGE};
use crate::services::legend::{LegendBuilder, CROP_LEGEND_STEPS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Crop dataset currently shown on the map
#[derive(Debug, Clone)]
pub struct CropSelection {
    pub id: Uuid,
    /// Name requested by the client
    pub name: String,
    /// Name served by the backend when it matched by similarity
    pub matched_name: Option<String>,
    pub data: MunicipalityDataset,
    pub range: ValueRange,
    /// Per-layer overrides from the request
    pub base_color: Option<Rgb>,
    pub state: Option<String>,
}

impl CropSelection {
    pub fn display_name(&self) -> &str {
        self.matched_name.as_deref().unwrap_or(&self.name)
    }
}

/// Mutable map state
#[derive(Debug, Clone)]
pub struct MapState {
    pub base_color: Rgb,
    pub opacity: f64,
    /// Upper-case UF
    pub state_filter: Option<String>,
    pub radius: Option<RadiusSelection>,
    pub current_crop: Option<CropSelection>,
    pub active_layers: Vec<ActiveLayer>,
}

/// Loaded boundary file, as reported by /health and /admin/status
#[derive(Debug, Clone, Serialize)]
pub struct BoundaryStatus {
    pub loaded: bool,
    pub source: Option<String>,
    pub feature_count: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Read-only view of the map state
#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub base_color: String,
    pub opacity: f64,
    pub state_filter: Option<String>,
    pub radius: Option<RadiusSelection>,
    pub current_crop: Option<String>,
    pub active_layers: Vec<ActiveLayer>,
    pub boundaries: BoundaryStatus,
}

/// Map controller
/// DOCUMENTATION: Created once in main and shared through `web::Data`.
/// Backend calls happen before any lock is taken; locks are held only while
/// styling in memory.
pub struct MapController {
    backend: BackendClient,
    loader: BoundaryLoader,
    boundaries: RwLock<Option<Arc<MunicipalityBoundaries>>>,
    state: RwLock<MapState>,
}

impl MapController {
    pub fn new(config: &Config) -> Result<Self, MapError> {
        let backend = BackendClient::new(
            &config.backend_base_url,
            config.backend_api_token.clone(),
            config.backend_timeout_secs,
        )?;
        let loader = BoundaryLoader::new(config.geojson_paths.clone(), config.backend_timeout_secs)?;

        Ok(Self {
            backend,
            loader,
            boundaries: RwLock::new(None),
            state: RwLock::new(MapState {
                base_color: Rgb::from_hex(&config.default_base_color)?,
                opacity: config.layer_opacity,
                state_filter: None,
                radius: None,
                current_crop: None,
                active_layers: Vec::new(),
            }),
        })
    }

    // ============================================
    // BOUNDARIES
    // ============================================

    /// Reload boundaries from the configured paths
    /// DOCUMENTATION: On failure the previously loaded boundaries stay in place
    pub async fn reload_boundaries(&self) -> Result<BoundaryStatus, MapError> {
        let boundaries = self.loader.load().await?;
        self.install_boundaries(boundaries).await;
        Ok(self.boundary_status().await)
    }

    pub async fn install_boundaries(&self, boundaries: MunicipalityBoundaries) {
        *self.boundaries.write().await = Some(Arc::new(boundaries));
    }

    pub async fn boundaries(&self) -> Option<Arc<MunicipalityBoundaries>> {
        self.boundaries.read().await.clone()
    }

    pub async fn boundary_status(&self) -> BoundaryStatus {
        match self.boundaries().await {
            Some(b) => BoundaryStatus {
                loaded: true,
                source: Some(b.source.clone()),
                feature_count: b.len(),
                loaded_at: Some(b.loaded_at),
            },
            None => BoundaryStatus {
                loaded: false,
                source: None,
                feature_count: 0,
                loaded_at: None,
            },
        }
    }

    pub fn boundary_paths(&self) -> &[String] {
        self.loader.paths()
    }

    // ============================================
    // STATE
    // ============================================

    pub async fn snapshot(&self) -> MapSnapshot {
        let boundaries = self.boundary_status().await;
        let state = self.state.read().await;

        MapSnapshot {
            base_color: state.base_color.to_hex(),
            opacity: state.opacity,
            state_filter: state.state_filter.clone(),
            radius: state.radius,
            current_crop: state
                .current_crop
                .as_ref()
                .map(|crop| crop.display_name().to_string()),
            active_layers: state.active_layers.clone(),
            boundaries,
        }
    }

    /// Set or clear the UF filter and re-render the current crop
    pub async fn set_state_filter(
        &self,
        state: Option<&str>,
    ) -> Result<Option<StyledLayer>, MapError> {
        let normalized = state.map(normalize_uf).transpose()?;
        log::info!("State filter set to {:?}", normalized);

        self.state.write().await.state_filter = normalized;
        self.render_current_crop().await
    }

    /// Set the radius filter and re-render the current crop
    pub async fn set_radius(
        &self,
        selection: RadiusSelection,
    ) -> Result<Option<StyledLayer>, MapError> {
        if !(selection.radius_km.is_finite() && selection.radius_km > 0.0) {
            return Err(MapError::InvalidInput(format!(
                "Radius must be positive, got {}",
                selection.radius_km
            )));
        }

        log::info!(
            "Radius filter: {}km around ({}, {})",
            selection.radius_km,
            selection.center.lat,
            selection.center.lng
        );
        self.state.write().await.radius = Some(selection);
        self.render_current_crop().await
    }

    pub async fn clear_radius(&self) -> Result<Option<StyledLayer>, MapError> {
        self.state.write().await.radius = None;
        self.render_current_crop().await
    }

    /// Change the default base color and/or the opacity multiplier
    pub async fn update_settings(
        &self,
        base_color: Option<&str>,
        opacity: Option<f64>,
    ) -> Result<MapSnapshot, MapError> {
        let base_color = base_color.map(Rgb::from_hex).transpose()?;
        if let Some(opacity) = opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(MapError::InvalidInput(format!(
                    "Opacity must be between 0 and 1, got {}",
                    opacity
                )));
            }
        }

        {
            let mut state = self.state.write().await;
            if let Some(base) = base_color {
                state.base_color = base;
            }
            if let Some(opacity) = opacity {
                state.opacity = opacity;
            }
        }

        Ok(self.snapshot().await)
    }

    // ============================================
    // CROP LAYER
    // ============================================

    /// Fetch a crop from the backend and make it the current crop layer
    pub async fn load_crop_layer(
        &self,
        crop: &str,
        query: &LayerQuery,
    ) -> Result<StyledLayer, MapError> {
        let (data, matched) = self.backend.crop_data(crop).await?;
        self.apply_crop_data(crop, matched, data, query).await
    }

    /// Make `data` the current crop and render it
    pub async fn apply_crop_data(
        &self,
        crop: &str,
        matched_name: Option<String>,
        data: MunicipalityDataset,
        query: &LayerQuery,
    ) -> Result<StyledLayer, MapError> {
        let selection = CropSelection {
            id: Uuid::new_v4(),
            name: crop.to_string(),
            matched_name,
            range: LayerBuilder::value_range(&data),
            data,
            base_color: query.base_color.as_deref().map(Rgb::from_hex).transpose()?,
            state: query.state.as_deref().map(normalize_uf).transpose()?,
        };

        let boundaries = self.boundaries().await;
        let mut state = self.state.write().await;
        let layer = render_crop(boundaries.as_deref(), &state, &selection);
        state.current_crop = Some(selection);

        log::info!(
            "Crop layer '{}' rendered: {} features{}",
            layer.name,
            layer.feature_count,
            if layer.fallback { " (demonstration markers)" } else { "" }
        );
        Ok(layer)
    }

    /// Render the current crop with the current filters, without refetching
    pub async fn render_current_crop(&self) -> Result<Option<StyledLayer>, MapError> {
        let boundaries = self.boundaries().await;
        let state = self.state.read().await;

        Ok(state
            .current_crop
            .as_ref()
            .map(|crop| render_crop(boundaries.as_deref(), &state, crop)))
    }

    // ============================================
    // METRIC LAYERS
    // ============================================

    pub async fn load_metric_layer(
        &self,
        category: &str,
        query: &LayerQuery,
    ) -> Result<StyledLayer, MapError> {
        let data = self.backend.metric_data(category).await?;
        self.apply_metric_data(category, data, query).await
    }

    /// Style a revenue dataset and register it as an active layer
    pub async fn apply_metric_data(
        &self,
        category: &str,
        data: MunicipalityDataset,
        query: &LayerQuery,
    ) -> Result<StyledLayer, MapError> {
        let boundaries = self.boundaries().await.ok_or(MapError::BoundariesUnavailable)?;
        let override_base = query.base_color.as_deref().map(Rgb::from_hex).transpose()?;
        let override_state = query.state.as_deref().map(normalize_uf).transpose()?;

        let mut state = self.state.write().await;
        let base = override_base.unwrap_or(state.base_color);
        let uf = override_state.or_else(|| state.state_filter.clone());
        let name = query.name.clone().unwrap_or_else(|| category.to_string());
        let unit = query
            .unit
            .clone()
            .or_else(|| data.values().find_map(|record| record.unit.clone()));
        let range = LayerBuilder::value_range(&data);

        let features = boundaries.filter_by_state(uf.as_deref());
        let styled = LayerBuilder::choropleth(&features, &data, range, base, state.opacity, |m, v| {
            LayerBuilder::metric_popup(m, &name, unit.as_deref(), v)
        });
        let (collection, bounds) = LayerBuilder::collection(styled);

        let layer = StyledLayer {
            id: Uuid::new_v4(),
            legend: Some(LegendBuilder::single(
                &name,
                range,
                base,
                CROP_LEGEND_STEPS,
                unit.as_deref(),
            )),
            name,
            kind: LayerKind::Metric,
            color: base.to_hex(),
            range,
            unit,
            matched_name: None,
            fallback: false,
            feature_count: collection.features.len(),
            bounds,
            analytics: None,
            features: collection,
            generated_at: Utc::now(),
        };

        state.active_layers.push(layer.to_active_layer());
        log::info!(
            "Metric layer '{}' registered ({} features)",
            layer.name,
            layer.feature_count
        );
        Ok(layer)
    }

    // ============================================
    // TERRITORY LAYERS
    // ============================================

    /// Passthrough listing of revendas/vendedores
    pub async fn list_entities(&self, kind: TerritoryKind) -> Result<Vec<TerritoryEntity>, MapError> {
        self.backend.list_entities(kind).await
    }

    /// Build one outline layer per requested revenda/vendedor
    /// DOCUMENTATION: An entity whose territory the backend cannot serve is
    /// logged and skipped; the others still produce layers
    pub async fn load_territory_layers(
        &self,
        request: &TerritoryLayerRequest,
    ) -> Result<Vec<StyledLayer>, MapError> {
        if request.is_empty() {
            return Err(MapError::InvalidInput(
                "Select at least one revenda or vendedor".to_string(),
            ));
        }
        if self.boundaries().await.is_none() {
            return Err(MapError::BoundariesUnavailable);
        }

        let mut layers = Vec::new();
        for (kind, ids) in [
            (TerritoryKind::Revenda, &request.revendas),
            (TerritoryKind::Vendedor, &request.vendedores),
        ] {
            if ids.is_empty() {
                continue;
            }

            let listed: HashMap<i64, TerritoryEntity> = self
                .backend
                .list_entities(kind)
                .await?
                .into_iter()
                .map(|entity| (entity.id, entity))
                .collect();

            let mut territories = Vec::with_capacity(ids.len());
            for id in ids {
                let payload = match self.backend.territory(kind, *id).await {
                    Ok(payload) => payload,
                    Err(e @ (MapError::NotFound(_) | MapError::BackendError(_))) => {
                        log::warn!("{} {} skipped: {}", kind.label(), id, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let entity = listed.get(id).cloned().unwrap_or_else(|| TerritoryEntity {
                    id: *id,
                    name: format!("{} {}", kind.label(), id),
                    color: None,
                    city: None,
                    state: None,
                    municipality_codes: Vec::new(),
                });
                territories.push((entity, payload));
            }

            layers.extend(self.apply_territories(kind, territories).await?);
        }

        Ok(layers)
    }

    /// Replace the layers of `kind` with one layer per territory
    /// DOCUMENTATION: Territories without any matching boundary feature are skipped.
    /// Analytics cover every territory code, drawn or not.
    pub async fn apply_territories(
        &self,
        kind: TerritoryKind,
        territories: Vec<(TerritoryEntity, TerritoryPayload)>,
    ) -> Result<Vec<StyledLayer>, MapError> {
        let boundaries = self.boundaries().await.ok_or(MapError::BoundariesUnavailable)?;
        let layer_kind = LayerKind::from(kind);

        let mut layers = Vec::new();
        for (entity, payload) in territories {
            let mut codes = payload.codes();
            if codes.is_empty() {
                codes = entity.municipality_codes.clone();
            }

            let wanted: HashSet<String> = codes.iter().cloned().collect();
            let matched = boundaries.select_codes(&wanted);
            if matched.is_empty() {
                log::warn!(
                    "{} {} ('{}') has no municipality in the boundary file, skipped",
                    kind.label(),
                    entity.id,
                    entity.name
                );
                continue;
            }

            let by_code: HashMap<String, MunicipalityRef> = matched
                .iter()
                .map(|feature| MunicipalityRef::from_feature(feature))
                .filter_map(|m| m.code.clone().map(|code| (code, m)))
                .collect();
            let ordered: Vec<MunicipalityRef> = codes
                .iter()
                .map(|code| {
                    by_code.get(code).cloned().unwrap_or_else(|| {
                        TerritoryAnalytics::from_record(code, payload.record(code))
                    })
                })
                .collect();

            let features = LayerBuilder::territory_features(&matched, kind, &entity);
            let (collection, bounds) = LayerBuilder::collection(features);

            layers.push(StyledLayer {
                id: Uuid::new_v4(),
                name: entity.name.clone(),
                kind: layer_kind,
                color: entity.color_or_default(kind),
                range: ValueRange::TERRITORY,
                unit: None,
                matched_name: None,
                fallback: false,
                feature_count: collection.features.len(),
                bounds,
                legend: None,
                analytics: Some(TerritoryAnalytics::summarize(&ordered)),
                features: collection,
                generated_at: Utc::now(),
            });
        }

        let mut state = self.state.write().await;
        state.active_layers.retain(|layer| layer.kind != layer_kind);
        state
            .active_layers
            .extend(layers.iter().map(StyledLayer::to_active_layer));

        log::info!("{} {} territory layers active", layers.len(), kind);
        Ok(layers)
    }

    // ============================================
    // ACTIVE LAYERS
    // ============================================

    pub async fn list_layers(&self) -> Vec<ActiveLayer> {
        self.state.read().await.active_layers.clone()
    }

    pub async fn set_layer_visibility(&self, id: Uuid, visible: bool) -> Result<ActiveLayer, MapError> {
        let mut state = self.state.write().await;
        let layer = state
            .active_layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or_else(|| MapError::NotFound(format!("Layer {} not found", id)))?;

        layer.visible = visible;
        Ok(layer.clone())
    }

    pub async fn remove_layer(&self, id: Uuid) -> Result<ActiveLayer, MapError> {
        let mut state = self.state.write().await;
        let position = state
            .active_layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or_else(|| MapError::NotFound(format!("Layer {} not found", id)))?;

        let removed = state.active_layers.remove(position);
        log::info!("Layer '{}' removed", removed.name);
        Ok(removed)
    }

    /// Legend over the visible active layers
    pub async fn combined_legend(&self) -> Result<Option<Legend>, MapError> {
        let state = self.state.read().await;
        LegendBuilder::combined(&state.active_layers)
    }
}

/// Crop layer for `crop` under the current filters
fn render_crop(
    boundaries: Option<&MunicipalityBoundaries>,
    state: &MapState,
    crop: &CropSelection,
) -> StyledLayer {
    let base = crop.base_color.unwrap_or(state.base_color);
    let display_name = crop.display_name().to_string();

    let (features, range, legend, fallback) = match boundaries {
        None => {
            let markers = LayerBuilder::fallback_capitals(&display_name, base);
            let legend = LegendBuilder::crop_legend(&display_name, FALLBACK_RANGE, base, None);
            (markers, FALLBACK_RANGE, legend, true)
        }
        Some(boundaries) => {
            let uf = crop.state.as_deref().or(state.state_filter.as_deref());
            let mut selected = boundaries.filter_by_state(uf);

            let note = state.radius.map(|radius| {
                selected = GeoDistance::filter_within_radius(selected.iter().copied(), &radius);
                LegendBuilder::radius_note(radius.radius_km, selected.len())
            });

            let styled = LayerBuilder::choropleth(
                &selected,
                &crop.data,
                crop.range,
                base,
                state.opacity,
                |m, v| LayerBuilder::crop_popup(m, &display_name, v),
            );
            let legend = LegendBuilder::crop_legend(&display_name, crop.range, base, note);
            (styled, crop.range, legend, false)
        }
    };

    let (collection, bounds) = LayerBuilder::collection(features);
    StyledLayer {
        id: crop.id,
        name: display_name,
        kind: LayerKind::Crop,
        color: base.to_hex(),
        range,
        unit: Some("ha".to_string()),
        matched_name: crop.matched_name.clone(),
        fallback,
        feature_count: collection.features.len(),
        bounds,
        legend: Some(legend),
        analytics: None,
        features: collection,
        generated_at: Utc::now(),
    }
}

/// Two ASCII letters, upper-cased
fn normalize_uf(raw: &str) -> Result<String, MapError> {
    let uf = raw.trim();
    if uf.len() == 2 && uf.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(uf.to_ascii_uppercase())
    } else {
        Err(MapError::InvalidInput(format!("Invalid state (UF): '{}'", raw)))
    }
}
