// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Coordinate, DistanceFormula, FacilityRecord, MatchPolicy, MatchRequest, RankedMatch,
    SkippedCandidate, SkippedRow, DEFAULT_RADIUS_KM,
};
pub use requests::DonationRequest;
pub use responses::{NearbyResponse, SubmitResponse};
