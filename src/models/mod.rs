// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod color;
pub mod geo;
pub mod layer;
pub mod municipality;
pub mod requests;
pub mod territory;

pub use color::*;
pub use geo::*;
pub use layer::*;
pub use municipality::*;
pub use requests::*;
pub use territory::*;
