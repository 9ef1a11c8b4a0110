// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::models::Rgb;
use dotenv::dotenv;
use std::env;

/// Boundary files tried in order until one loads
pub const DEFAULT_GEOJSON_PATHS: &str = "static/data/brazil_municipalities_all.geojson,\
attached_assets/brazil_municipalities_all_1752980285489.geojson,\
static/data/brazil_municipalities_combined.geojson,\
static/data/br_municipalities_simplified.geojson";

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Base URL of the dashboard REST backend (crop data, revendas, vendedores)
    pub backend_base_url: String,

    /// Optional bearer token forwarded to the backend
    pub backend_api_token: String,

    /// Backend request timeout in seconds
    pub backend_timeout_secs: u64,

    /// Admin authentication token (for boundary reloads)
    pub admin_token: String,

    /// Municipality boundary sources, first one that loads wins.
    /// Entries may be local paths or http(s) URLs.
    pub geojson_paths: Vec<String>,

    /// Base color used for metric layers when the request does not name one
    pub default_base_color: String,

    /// Radius applied when a radius request omits it
    pub default_radius_km: f64,

    /// Global layer opacity multiplier (0.0 - 1.0)
    pub layer_opacity: f64,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        dotenv().ok();

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8003".to_string())
                .parse()
                .unwrap_or(8003),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),

            backend_api_token: env::var("BACKEND_API_TOKEN").unwrap_or_else(|_| String::new()),

            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "admin-token-dev".to_string()),

            geojson_paths: parse_path_list(
                &env::var("GEOJSON_PATHS").unwrap_or_else(|_| DEFAULT_GEOJSON_PATHS.to_string()),
            ),

            default_base_color: env::var("DEFAULT_BASE_COLOR")
                .unwrap_or_else(|_| "#4CAF50".to_string()),

            default_radius_km: env::var("DEFAULT_RADIUS_KM")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50.0),

            layer_opacity: env::var("LAYER_OPACITY")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .unwrap_or(1.0),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.backend_base_url.is_empty() {
            return Err("BACKEND_BASE_URL is required".to_string());
        }

        if Rgb::from_hex(&self.default_base_color).is_err() {
            return Err(format!(
                "DEFAULT_BASE_COLOR is not a #rrggbb color: {}",
                self.default_base_color
            ));
        }

        if !(0.0..=1.0).contains(&self.layer_opacity) {
            return Err(format!(
                "LAYER_OPACITY must be between 0 and 1, got {}",
                self.layer_opacity
            ));
        }

        if self.default_radius_km <= 0.0 {
            return Err("DEFAULT_RADIUS_KM must be positive".to_string());
        }

        if self.geojson_paths.is_empty() {
            return Err("GEOJSON_PATHS must list at least one boundary file".to_string());
        }

        if self.backend_api_token.is_empty() {
            log::warn!("BACKEND_API_TOKEN not configured - backend requests are unauthenticated");
        }

        Ok(())
    }
}

fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Local settings for unit and handler tests
    pub fn test_defaults() -> Self {
        Config {
            server_address: "127.0.0.1".to_string(),
            server_port: 8003,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            backend_base_url: "http://localhost:5000".to_string(),
            backend_api_token: "token".to_string(),
            backend_timeout_secs: 5,
            admin_token: "secret".to_string(),
            geojson_paths: vec!["a.geojson".to_string()],
            default_base_color: "#4CAF50".to_string(),
            default_radius_km: 50.0,
            layer_opacity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_keep_order() {
        let paths = parse_path_list(DEFAULT_GEOJSON_PATHS);
        assert_eq!(paths.len(), 4);
        assert_eq!(paths[0], "static/data/brazil_municipalities_all.geojson");
        assert_eq!(paths[3], "static/data/br_municipalities_simplified.geojson");
    }

    #[test]
    fn test_path_list_skips_blanks() {
        let paths = parse_path_list(" a.geojson, ,https://x/b.geojson,");
        assert_eq!(paths, vec!["a.geojson", "https://x/b.geojson"]);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::test_defaults().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_color() {
        let mut config = Config::test_defaults();
        config.default_base_color = "green".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_opacity_out_of_range() {
        let mut config = Config::test_defaults();
        config.layer_opacity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = Config::test_defaults();
        config.geojson_paths.clear();
        assert!(config.validate().is_err());
    }
}
