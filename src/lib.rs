//! Fits a customer's inventory into standard storage units.
//!
//! The core is a shelf-based Next-Fit-Decreasing packer (`optimizer`) that
//! returns exact placements, plus the metrics and renderer coordinates built
//! from them. `api` exposes it over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod types;
pub mod visualization;

pub use error::{PackingError, ValidationError};
pub use metrics::calculate_recommended_units;
pub use model::{PackedItem, SelectedItem};
pub use optimizer::{PackingConfig, PackingResult, pack_items};
