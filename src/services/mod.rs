// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod analytics;
pub mod backend_client;
pub mod boundary_loader;
pub mod color_scale;
pub mod geo_distance;
pub mod layer_builder;
pub mod legend;
pub mod map_controller;

pub use color_scale::*;
pub use geo_distance::*;
pub use legend::*;
pub use map_controller::*;
