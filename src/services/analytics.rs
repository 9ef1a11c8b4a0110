// src/services/analytics.rs
// DOCUMENTATION: Territory analytics
// PURPOSE: Summarize the municipalities covered by a revenda/vendedor territory

use crate::models::{MunicipalityRecord, MunicipalityRef, TerritorySummary};

/// Entries in the "top municipalities" list
pub const TOP_MUNICIPALITIES: usize = 5;

/// UF shown when a municipality has none
pub const UNKNOWN_STATE: &str = "XX";

pub struct TerritoryAnalytics;

impl TerritoryAnalytics {
    /// Summary over `municipalities`, kept in the given order
    pub fn summarize(municipalities: &[MunicipalityRef]) -> TerritorySummary {
        let ranking: Vec<MunicipalityRef> = municipalities
            .iter()
            .map(|m| MunicipalityRef {
                code: m.code.clone(),
                name: m.name.clone(),
                state: Some(m.state.clone().unwrap_or_else(|| UNKNOWN_STATE.to_string())),
            })
            .collect();

        let mut states: Vec<String> = Vec::new();
        for state in ranking.iter().filter_map(|m| m.state.as_ref()) {
            if !states.contains(state) {
                states.push(state.clone());
            }
        }

        let principal_state = match states.as_slice() {
            [single] => single.clone(),
            _ => format!("{} estados", states.len()),
        };

        TerritorySummary {
            municipality_count: ranking.len(),
            states,
            principal_state,
            top_municipalities: ranking.iter().take(TOP_MUNICIPALITIES).cloned().collect(),
            ranking,
        }
    }

    /// Identity of a territory municipality from the backend record, when
    /// there is no boundary feature for it
    pub fn from_record(code: &str, record: Option<&MunicipalityRecord>) -> MunicipalityRef {
        MunicipalityRef {
            code: Some(code.to_string()),
            name: record
                .and_then(|r| r.municipality_name.clone())
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Município {}", code)),
            state: record.and_then(|r| r.state_code.clone()),
        }
    }
}
