// Core algorithm exports
pub mod distance;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod store;

pub use distance::{distance_km, geodesic_distance, haversine_distance, DistanceFault};
pub use error::{ErrorKind, LocatorError, SkipReason};
pub use filters::{is_within_radius, rank_within_radius, rank_within_radius_by, RankOutcome};
pub use matcher::{MatchResult, MatchService};
pub use scoring::{donation_points, DEFAULT_POINTS_PER_UNIT};
pub use store::{LocationStore, SharedStore};
