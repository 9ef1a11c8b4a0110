// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod admin;
pub mod health;
pub mod layers;
pub mod map;
pub mod scale;
pub mod territories;

pub use admin::config as admin_config;
pub use health::config as health_config;
pub use layers::config as layers_config;
pub use map::config as map_config;
pub use scale::config as scale_config;
pub use territories::config as territories_config;
