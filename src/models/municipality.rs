// src/models/municipality.rs
// DOCUMENTATION: Municipality identity and per-municipality metric records
// PURPOSE: Read IBGE code/name/UF from inconsistent GeoJSON properties and
// deserialize the metric rows served by the backend

use geojson::{Feature, JsonObject, JsonValue};
use serde::{Deserialize, Deserializer, Serialize};

/// Property keys holding the IBGE geocode, in lookup order
pub const CODE_KEYS: [&str; 5] = ["GEOCODIGO", "CD_MUN", "cd_geocmu", "geocodigo", "CD_GEOCMU"];

/// Property keys holding the municipality name, in lookup order
pub const NAME_KEYS: [&str; 4] = ["NOME", "NM_MUN", "nm_mun", "nome"];

/// Property keys holding the state (UF) abbreviation, in lookup order
pub const STATE_KEYS: [&str; 3] = ["UF", "SIGLA_UF", "uf"];

pub const UNKNOWN_NAME: &str = "Nome não disponível";

/// Identity of one municipality feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityRef {
    /// IBGE geocode as a string (files store it as either string or number)
    pub code: Option<String>,
    pub name: String,
    /// Two-letter UF
    pub state: Option<String>,
}

impl MunicipalityRef {
    pub fn from_properties(properties: Option<&JsonObject>) -> Self {
        let lookup = |keys: &[&str]| properties.and_then(|props| first_text(props, keys));

        MunicipalityRef {
            code: lookup(&CODE_KEYS[..]),
            name: lookup(&NAME_KEYS[..]).unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            state: lookup(&STATE_KEYS[..]),
        }
    }

    pub fn from_feature(feature: &Feature) -> Self {
        Self::from_properties(feature.properties.as_ref())
    }

    /// "Name (UF)", or just the name when the UF is unknown
    pub fn title(&self) -> String {
        match &self.state {
            Some(uf) => format!("{} ({})", self.name, uf),
            None => self.name.clone(),
        }
    }

    pub fn code_or_na(&self) -> &str {
        self.code.as_deref().unwrap_or("N/A")
    }
}

/// First non-empty value among `keys`, stringified
fn first_text(props: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(number_to_code(n)),
        _ => None,
    })
}

fn number_to_code(n: &serde_json::Number) -> String {
    // Geocodes sometimes arrive as floats (3550308.0)
    match (n.as_i64(), n.as_f64()) {
        (Some(i), _) => i.to_string(),
        (None, Some(f)) if f.fract() == 0.0 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// One municipality row of a metric dataset served by the backend
/// DOCUMENTATION: Crop datasets carry `harvested_area`, revenue and territory
/// datasets carry `value`. Numbers may arrive as JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRecord {
    #[serde(default)]
    pub municipality_name: Option<String>,

    #[serde(default)]
    pub state_code: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub harvested_area: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,

    #[serde(default)]
    pub unit: Option<String>,
}

impl MunicipalityRecord {
    /// Generic metric value: `value`, falling back to `harvested_area`
    pub fn metric(&self) -> Option<f64> {
        self.value.or(self.harvested_area)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match raw {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: JsonValue) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_primary_keys() {
        let p = props(json!({"GEOCODIGO": "3550308", "NOME": "São Paulo", "UF": "SP"}));
        let m = MunicipalityRef::from_properties(Some(&p));
        assert_eq!(m.code.as_deref(), Some("3550308"));
        assert_eq!(m.name, "São Paulo");
        assert_eq!(m.title(), "São Paulo (SP)");
    }

    #[test]
    fn test_falls_back_through_alternate_keys() {
        let p = props(json!({"CD_MUN": 3304557, "NM_MUN": "Rio de Janeiro", "SIGLA_UF": "RJ"}));
        let m = MunicipalityRef::from_properties(Some(&p));
        assert_eq!(m.code.as_deref(), Some("3304557"));
        assert_eq!(m.name, "Rio de Janeiro");
        assert_eq!(m.state.as_deref(), Some("RJ"));
    }

    #[test]
    fn test_float_geocode_is_normalized() {
        let p = props(json!({"cd_geocmu": 5300108.0}));
        let m = MunicipalityRef::from_properties(Some(&p));
        assert_eq!(m.code.as_deref(), Some("5300108"));
    }

    #[test]
    fn test_missing_properties_use_defaults() {
        let m = MunicipalityRef::from_properties(None);
        assert_eq!(m.code, None);
        assert_eq!(m.name, UNKNOWN_NAME);
        assert_eq!(m.title(), UNKNOWN_NAME);
        assert_eq!(m.code_or_na(), "N/A");
    }

    #[test]
    fn test_empty_string_skips_to_next_key() {
        let p = props(json!({"GEOCODIGO": "", "CD_MUN": "4106902"}));
        let m = MunicipalityRef::from_properties(Some(&p));
        assert_eq!(m.code.as_deref(), Some("4106902"));
    }

    #[test]
    fn test_record_accepts_string_numbers() {
        let record: MunicipalityRecord = serde_json::from_value(json!({
            "municipality_name": "Sorriso",
            "state_code": "MT",
            "harvested_area": "600000.5"
        }))
        .unwrap();
        assert_eq!(record.harvested_area, Some(600000.5));
        assert_eq!(record.metric(), Some(600000.5));
    }

    #[test]
    fn test_record_prefers_value_for_metric() {
        let record: MunicipalityRecord =
            serde_json::from_value(json!({"value": 12.0, "harvested_area": 99.0})).unwrap();
        assert_eq!(record.metric(), Some(12.0));
    }

    #[test]
    fn test_record_tolerates_null_and_garbage() {
        let record: MunicipalityRecord =
            serde_json::from_value(json!({"harvested_area": null, "value": "n/d"})).unwrap();
        assert_eq!(record.metric(), None);
    }
}
