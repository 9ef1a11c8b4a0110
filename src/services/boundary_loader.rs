// src/services/boundary_loader.rs
// DOCUMENTATION: Municipality boundary loading
// PURPOSE: Load the IBGE municipality GeoJSON from the first configured
// location that answers, and select features by state or code

use crate::errors::MapError;
use crate::models::MunicipalityRef;
use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, GeoJson};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

/// Loaded municipality boundaries
#[derive(Debug, Clone)]
pub struct MunicipalityBoundaries {
    /// Path or URL the collection came from
    pub source: String,
    pub collection: FeatureCollection,
    pub loaded_at: DateTime<Utc>,
}

impl MunicipalityBoundaries {
    /// Parse a GeoJSON document that must be a FeatureCollection
    pub fn from_geojson_str(source: &str, raw: &str) -> Result<Self, MapError> {
        let geojson: GeoJson = raw
            .parse()
            .map_err(|e| MapError::InvalidInput(format!("Invalid GeoJSON in {}: {}", source, e)))?;

        let collection = match geojson {
            GeoJson::FeatureCollection(collection) => collection,
            _ => {
                return Err(MapError::InvalidInput(format!(
                    "{} is not a FeatureCollection",
                    source
                )))
            }
        };

        Ok(Self {
            source: source.to_string(),
            collection,
            loaded_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.collection.features
    }

    /// Features of one UF (case-insensitive), or all when `state` is None
    pub fn filter_by_state(&self, state: Option<&str>) -> Vec<&Feature> {
        match state {
            None => self.features().iter().collect(),
            Some(uf) => self
                .features()
                .iter()
                .filter(|feature| {
                    MunicipalityRef::from_feature(feature)
                        .state
                        .map(|s| s.eq_ignore_ascii_case(uf))
                        .unwrap_or(false)
                })
                .collect(),
        }
    }

    /// Features whose IBGE code is in `codes`, in collection order
    pub fn select_codes(&self, codes: &HashSet<String>) -> Vec<&Feature> {
        self.features()
            .iter()
            .filter(|feature| {
                MunicipalityRef::from_feature(feature)
                    .code
                    .map(|code| codes.contains(&code))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Boundary loader
/// DOCUMENTATION: Tries each location in order. `http(s)://` locations are
/// fetched, anything else is read from disk. The first valid collection wins.
pub struct BoundaryLoader {
    client: Client,
    paths: Vec<String>,
}

impl BoundaryLoader {
    pub fn new(paths: Vec<String>, timeout_secs: u64) -> Result<Self, MapError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MapError::InternalError(format!("HTTP client: {}", e)))?;

        Ok(Self { client, paths })
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub async fn load(&self) -> Result<MunicipalityBoundaries, MapError> {
        for path in &self.paths {
            log::info!("Loading municipality boundaries from {}", path);

            match self.load_one(path).await {
                Ok(boundaries) if boundaries.is_empty() => {
                    log::warn!("Boundary source {} has no features, trying next", path)
                }
                Ok(boundaries) => {
                    log::info!(
                        "✅ Loaded {} municipality features from {}",
                        boundaries.len(),
                        path
                    );
                    return Ok(boundaries);
                }
                Err(e) => log::warn!("Boundary source {} failed: {}", path, e),
            }
        }

        log::error!(
            "❌ None of the {} boundary sources could be loaded",
            self.paths.len()
        );
        Err(MapError::BoundariesUnavailable)
    }

    async fn load_one(&self, path: &str) -> Result<MunicipalityBoundaries, MapError> {
        let raw = if is_remote(path) {
            let response = self
                .client
                .get(path)
                .send()
                .await
                .map_err(|e| MapError::BackendError(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(MapError::BackendError(format!(
                    "HTTP {} for {}",
                    response.status(),
                    path
                )));
            }

            response
                .text()
                .await
                .map_err(|e| MapError::BackendError(format!("Read error: {}", e)))?
        } else {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MapError::NotFound(format!("{}: {}", path, e)))?
        };

        MunicipalityBoundaries::from_geojson_str(path, &raw)
    }
}

fn is_remote(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"GEOCODIGO": "3550308", "NOME": "São Paulo", "UF": "SP"},
             "geometry": {"type": "Polygon", "coordinates": [[[-46.8, -23.7], [-46.4, -23.7], [-46.4, -23.4], [-46.8, -23.4], [-46.8, -23.7]]]}},
            {"type": "Feature", "properties": {"CD_MUN": 3304557, "NM_MUN": "Rio de Janeiro", "SIGLA_UF": "RJ"},
             "geometry": {"type": "Polygon", "coordinates": [[[-43.8, -23.1], [-43.1, -23.1], [-43.1, -22.7], [-43.8, -22.7], [-43.8, -23.1]]]}},
            {"type": "Feature", "properties": {"GEOCODIGO": "3509502", "NOME": "Campinas", "UF": "sp"},
             "geometry": {"type": "Polygon", "coordinates": [[[-47.2, -23.0], [-46.9, -23.0], [-46.9, -22.7], [-47.2, -22.7], [-47.2, -23.0]]]}}
        ]
    }"#;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("boundaries-{}.json", Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parses_feature_collection() {
        let boundaries = MunicipalityBoundaries::from_geojson_str("inline", SAMPLE).unwrap();
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries.source, "inline");
    }

    #[test]
    fn test_rejects_non_collection() {
        let single = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        assert!(MunicipalityBoundaries::from_geojson_str("inline", single).is_err());
        assert!(MunicipalityBoundaries::from_geojson_str("inline", "{").is_err());
    }

    #[test]
    fn test_filter_by_state_is_case_insensitive() {
        let boundaries = MunicipalityBoundaries::from_geojson_str("inline", SAMPLE).unwrap();
        assert_eq!(boundaries.filter_by_state(Some("SP")).len(), 2);
        assert_eq!(boundaries.filter_by_state(Some("rj")).len(), 1);
        assert_eq!(boundaries.filter_by_state(Some("MT")).len(), 0);
        assert_eq!(boundaries.filter_by_state(None).len(), 3);
    }

    #[test]
    fn test_select_codes_matches_numeric_properties() {
        let boundaries = MunicipalityBoundaries::from_geojson_str("inline", SAMPLE).unwrap();
        let codes: HashSet<String> = ["3304557", "3509502", "9999999"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let selected = boundaries.select_codes(&codes);
        assert_eq!(selected.len(), 2);
        assert_eq!(MunicipalityRef::from_feature(selected[0]).name, "Rio de Janeiro");
    }

    #[tokio::test]
    async fn test_first_loadable_path_wins() {
        let broken = temp_file("not json");
        let good = temp_file(SAMPLE);
        let loader = BoundaryLoader::new(
            vec![
                "/nonexistent/municipios.json".to_string(),
                broken.display().to_string(),
                good.display().to_string(),
            ],
            5,
        )
        .unwrap();

        let boundaries = loader.load().await.unwrap();
        assert_eq!(boundaries.source, good.display().to_string());
        assert_eq!(boundaries.len(), 3);

        std::fs::remove_file(broken).ok();
        std::fs::remove_file(good).ok();
    }

    #[tokio::test]
    async fn test_empty_collection_falls_through() {
        let empty = temp_file(r#"{"type": "FeatureCollection", "features": []}"#);
        let good = temp_file(SAMPLE);
        let loader = BoundaryLoader::new(
            vec![empty.display().to_string(), good.display().to_string()],
            5,
        )
        .unwrap();

        let boundaries = loader.load().await.unwrap();
        assert_eq!(boundaries.source, good.display().to_string());
        assert!(!boundaries.is_empty());

        std::fs::remove_file(empty).ok();
        std::fs::remove_file(good).ok();
    }

    #[tokio::test]
    async fn test_all_paths_failing_is_unavailable() {
        let loader = BoundaryLoader::new(vec!["/nonexistent/a.json".to_string()], 5).unwrap();
        assert!(matches!(
            loader.load().await,
            Err(MapError::BoundariesUnavailable)
        ));

        let empty = BoundaryLoader::new(vec![], 5).unwrap();
        assert!(matches!(empty.load().await, Err(MapError::BoundariesUnavailable)));
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://example.org/municipios.json"));
        assert!(is_remote("HTTP://example.org/x"));
        assert!(!is_remote("static/data/municipios.json"));
    }
}
