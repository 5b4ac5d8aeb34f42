//! Food Bank Locator - nearest food bank matching for NGO donation requests
//!
//! This library loads a table of food banks once and answers "which food
//! banks are within reach of this donor" queries, ranked by geodesic
//! distance. It also carries the donation intake model and the plant
//! diagnosis adapter used by the surrounding application.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance_km, LocationStore, LocatorError, MatchResult, MatchService, SharedStore};
pub use crate::models::{Coordinate, FacilityRecord, MatchRequest, NearbyResponse, RankedMatch};
