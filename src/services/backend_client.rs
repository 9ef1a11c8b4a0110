// src/services/backend_client.rs
// DOCUMENTATION: Dashboard backend API client
// PURPOSE: Fetch crop, revenue and territory datasets keyed by IBGE code

use crate::errors::MapError;
use crate::models::{
    BackendEnvelope, EntityListEnvelope, MunicipalityRecord, TerritoryEntity, TerritoryKind,
    TerritoryPayload,
};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-municipality dataset keyed by IBGE code
pub type MunicipalityDataset = BTreeMap<String, MunicipalityRecord>;

/// Backend API client
/// DOCUMENTATION: Every endpoint answers `{success, data | <collection>, error}`.
/// `success: false` and HTTP 404 become NotFound, other failures BackendError.
pub struct BackendClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the backend (path segments are appended)
    base_url: Url,
    /// Bearer token; empty means unauthenticated
    api_token: String,
}

impl BackendClient {
    /// Create new backend client
    /// DOCUMENTATION: Fails when the base URL does not parse or cannot carry a path
    pub fn new(base_url: &str, api_token: String, timeout_secs: u64) -> Result<Self, MapError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MapError::InvalidInput(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MapError::InvalidInput(format!(
                "Backend URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MapError::InternalError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    /// Harvested area per municipality for one crop
    ///
    /// # Returns
    /// The dataset and, when the backend matched by similarity, the crop name it served
    pub async fn crop_data(
        &self,
        crop: &str,
    ) -> Result<(MunicipalityDataset, Option<String>), MapError> {
        let envelope: BackendEnvelope<MunicipalityDataset> =
            self.get_json(&["api", "crop-data", crop]).await?;
        let envelope = ensure_success(envelope, || format!("Cultura '{}' não encontrada", crop))?;

        log::info!(
            "Backend crop data for '{}': {} municipalities{}",
            crop,
            envelope.data.as_ref().map(|d| d.len()).unwrap_or(0),
            envelope
                .matched_crop
                .as_deref()
                .map(|m| format!(" (matched '{}')", m))
                .unwrap_or_default()
        );

        Ok((envelope.data.unwrap_or_default(), envelope.matched_crop))
    }

    /// Revenue metric per municipality for one category
    pub async fn metric_data(&self, category: &str) -> Result<MunicipalityDataset, MapError> {
        let envelope: BackendEnvelope<MunicipalityDataset> =
            self.get_json(&["api", "receita", category]).await?;
        let envelope = ensure_success(envelope, || {
            format!("Categoria de receita '{}' não encontrada", category)
        })?;

        Ok(envelope.data.unwrap_or_default())
    }

    /// All revendas or vendedores
    pub async fn list_entities(&self, kind: TerritoryKind) -> Result<Vec<TerritoryEntity>, MapError> {
        let envelope: EntityListEnvelope = self.get_json(&["api", kind.collection()]).await?;
        if !envelope.success {
            let msg = envelope
                .error
                .unwrap_or_else(|| format!("Falha ao listar {}", kind));
            log::warn!("Backend refused {} listing: {}", kind, msg);
            return Err(MapError::BackendError(msg));
        }

        log::debug!("Backend listed {} {}", envelope.entities.len(), kind);
        Ok(envelope.entities)
    }

    /// Territory of one entity
    pub async fn territory(&self, kind: TerritoryKind, id: i64) -> Result<TerritoryPayload, MapError> {
        let id = id.to_string();
        let envelope: BackendEnvelope<TerritoryPayload> = self
            .get_json(&["api", kind.collection(), "data", &id])
            .await?;
        let envelope = ensure_success(envelope, || {
            format!("{} {} não encontrado", kind.label(), id)
        })?;

        envelope
            .data
            .ok_or_else(|| MapError::NotFound(format!("{} {} sem território", kind.label(), id)))
    }

    /// Absolute URL for `segments`, each one percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, MapError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MapError::InternalError("Backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, MapError> {
        let url = self.endpoint(segments)?;
        log::debug!("Backend GET {}", url);

        let mut request = self.client.get(url.clone());
        if !self.api_token.is_empty() {
            request = request.bearer_auth(&self.api_token);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("Backend request to {} failed: {}", url, e);
            MapError::BackendError(format!("Request failed: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            log::error!("Failed to read backend response from {}: {}", url, e);
            MapError::BackendError(format!("Read error: {}", e))
        })?;

        parse_response(status, &body)
    }
}

/// Decode a backend response body according to its status
fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, MapError> {
    if status == StatusCode::NOT_FOUND {
        let message = serde_json::from_str::<BackendEnvelope<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| "Resource not found".to_string());
        return Err(MapError::NotFound(message));
    }

    if !status.is_success() {
        log::error!("Backend API error {}: {}", status, body);
        return Err(MapError::BackendError(format!("API error {}: {}", status, body)));
    }

    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse backend response: {}", e);
        MapError::BackendError(format!("Parse error: {}", e))
    })
}

fn ensure_success<T>(
    envelope: BackendEnvelope<T>,
    fallback: impl FnOnce() -> String,
) -> Result<BackendEnvelope<T>, MapError> {
    if envelope.success {
        Ok(envelope)
    } else {
        Err(MapError::NotFound(envelope.error.unwrap_or_else(fallback)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(base, String::new(), 5).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            BackendClient::new("not a url", String::new(), 5),
            Err(MapError::InvalidInput(_))
        ));
        assert!(BackendClient::new("mailto:someone@example.com", String::new(), 5).is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = client("http://127.0.0.1:5000")
            .endpoint(&["api", "crop-data", "Cana-de-açúcar / safra"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/crop-data/Cana-de-a%C3%A7%C3%BAcar%20%2F%20safra"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("http://backend.local/dashboard/")
            .endpoint(&["api", "revendas", "data", "7"])
            .unwrap();
        assert_eq!(url.path(), "/dashboard/api/revendas/data/7");
    }

    #[test]
    fn test_parse_crop_envelope() {
        let body = r#"{"success": true, "matched_crop": "Soja (em grão)",
            "data": {"5107925": {"municipality_name": "Sorriso", "state_code": "MT", "harvested_area": 600000}}}"#;
        let envelope: BackendEnvelope<MunicipalityDataset> =
            parse_response(StatusCode::OK, body).unwrap();
        let envelope = ensure_success(envelope, || unreachable!()).unwrap();
        assert_eq!(envelope.matched_crop.as_deref(), Some("Soja (em grão)"));
        assert_eq!(
            envelope.data.unwrap()["5107925"].harvested_area,
            Some(600000.0)
        );
    }

    #[test]
    fn test_not_found_carries_backend_message() {
        let body = r#"{"success": false, "error": "Categoria de receita \"x\" não encontrada"}"#;
        let result: Result<BackendEnvelope<MunicipalityDataset>, _> =
            parse_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(result, Err(MapError::NotFound(msg)) if msg.contains("não encontrada")));
    }

    #[test]
    fn test_server_error_is_backend_error() {
        let result: Result<BackendEnvelope<MunicipalityDataset>, _> =
            parse_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(result, Err(MapError::BackendError(_))));
    }

    #[test]
    fn test_garbage_body_is_backend_error() {
        let result: Result<EntityListEnvelope, _> = parse_response(StatusCode::OK, "<html>");
        assert!(matches!(result, Err(MapError::BackendError(msg)) if msg.starts_with("Parse error")));
    }

    #[test]
    fn test_unsuccessful_envelope_is_not_found() {
        let envelope: BackendEnvelope<MunicipalityDataset> =
            parse_response(StatusCode::OK, r#"{"success": false, "error": "Cultura não encontrada"}"#)
                .unwrap();
        let result = ensure_success(envelope, || "fallback".to_string());
        assert!(matches!(result, Err(MapError::NotFound(msg)) if msg == "Cultura não encontrada"));
    }
}
