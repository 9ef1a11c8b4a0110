// src/models/territory.rs
// DOCUMENTATION: Revenda/vendedor entities, territory payloads and backend envelopes
// PURPOSE: Deserialize what the dashboard backend returns for territories

use super::{MunicipalityRecord, MunicipalityRef, Rgb};
use geojson::JsonValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which kind of territory owner a layer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerritoryKind {
    Revenda,
    Vendedor,
}

impl TerritoryKind {
    /// Backend collection segment (`/api/revendas`, `/api/vendedores`)
    pub fn collection(&self) -> &'static str {
        match self {
            TerritoryKind::Revenda => "revendas",
            TerritoryKind::Vendedor => "vendedores",
        }
    }

    /// Border color used when the entity has none
    pub fn default_color(&self) -> &'static str {
        match self {
            TerritoryKind::Revenda => "#ff5722",
            TerritoryKind::Vendedor => "#2196f3",
        }
    }

    /// Popup label ("Revenda", "Vendedor")
    pub fn label(&self) -> &'static str {
        match self {
            TerritoryKind::Revenda => "Revenda",
            TerritoryKind::Vendedor => "Vendedor",
        }
    }
}

impl fmt::Display for TerritoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// A reseller or sales rep as listed by the backend
/// DOCUMENTATION: Only the fields the map needs; the backend sends many more
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryEntity {
    pub id: i64,

    #[serde(rename = "nome", default)]
    pub name: String,

    /// Display color (`cor`)
    #[serde(rename = "cor", default)]
    pub color: Option<String>,

    #[serde(rename = "cidade", default)]
    pub city: Option<String>,

    #[serde(rename = "estado", default)]
    pub state: Option<String>,

    /// IBGE codes of the territory
    #[serde(rename = "municipios_codigos", default, deserialize_with = "codes_as_strings")]
    pub municipality_codes: Vec<String>,
}

impl TerritoryEntity {
    /// Entity color as `#rrggbb`; missing or unparsable colors use the kind's default
    pub fn color_or_default(&self, kind: TerritoryKind) -> String {
        let raw = self.color.as_deref().filter(|c| !c.trim().is_empty());
        match raw.map(Rgb::from_hex) {
            Some(Ok(rgb)) => rgb.to_hex(),
            Some(Err(_)) => {
                log::warn!(
                    "{} {} has unusable color {:?}, using {}",
                    kind.label(),
                    self.id,
                    self.color,
                    kind.default_color()
                );
                kind.default_color().to_string()
            }
            None => kind.default_color().to_string(),
        }
    }
}

fn codes_as_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<JsonValue>>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().iter().filter_map(json_code).collect())
}

fn json_code(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Territory data for one entity
/// DOCUMENTATION: The backend has served both shapes over time: a bare list of
/// codes, or an object keyed by code with municipality details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerritoryPayload {
    Codes(Vec<JsonValue>),
    Keyed(BTreeMap<String, MunicipalityRecord>),
}

impl TerritoryPayload {
    /// Territory codes in payload order, deduplicated
    pub fn codes(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let codes: Vec<String> = match self {
            TerritoryPayload::Codes(values) => values.iter().filter_map(json_code).collect(),
            TerritoryPayload::Keyed(map) => map.keys().cloned().collect(),
        };
        codes.into_iter().filter(|c| seen.insert(c.clone())).collect()
    }

    pub fn record(&self, code: &str) -> Option<&MunicipalityRecord> {
        match self {
            TerritoryPayload::Keyed(map) => map.get(code),
            TerritoryPayload::Codes(_) => None,
        }
    }
}

/// Standard `{success, data, error}` envelope used by the backend
#[derive(Debug, Deserialize)]
pub struct BackendEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    /// Set when a crop was found by similarity instead of exact name
    #[serde(default)]
    pub matched_crop: Option<String>,
}

/// `{success, revendas: [...]}` or `{success, vendedores: [...]}`
#[derive(Debug, Deserialize)]
pub struct EntityListEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "revendas", alias = "vendedores", default)]
    pub entities: Vec<TerritoryEntity>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Analytics shown next to a territory layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritorySummary {
    pub municipality_count: usize,
    /// Distinct UFs, in first-seen order
    pub states: Vec<String>,
    /// The single UF, or "N estados"
    pub principal_state: String,
    pub top_municipalities: Vec<MunicipalityRef>,
    pub ranking: Vec<MunicipalityRef>,
}
