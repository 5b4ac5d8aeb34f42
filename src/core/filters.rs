use crate::core::distance::{distance_km, DistanceFault};
use crate::models::{Coordinate, DistanceFormula, FacilityRecord, RankedMatch, SkippedCandidate};

/// Ranked facilities within a radius, plus anything that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub matches: Vec<RankedMatch>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Check whether a distance falls inside the radius (boundary included)
#[inline]
pub fn is_within_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km <= radius_km
}

/// Keep the facilities within `radius_km` of `requester`, nearest first
///
/// Facilities whose distance cannot be computed are skipped and reported,
/// never fatal. Ties keep the input order.
pub fn rank_within_radius(
    requester: &Coordinate,
    radius_km: f64,
    facilities: &[FacilityRecord],
    formula: DistanceFormula,
) -> RankOutcome {
    rank_within_radius_by(requester, radius_km, facilities, |a, b| {
        distance_km(a, b, formula)
    })
}

/// Same as [`rank_within_radius`] with a caller-supplied distance function
pub fn rank_within_radius_by<F>(
    requester: &Coordinate,
    radius_km: f64,
    facilities: &[FacilityRecord],
    distance: F,
) -> RankOutcome
where
    F: Fn(&Coordinate, &Coordinate) -> Result<f64, DistanceFault>,
{
    let mut outcome = RankOutcome::default();

    for (index, facility) in facilities.iter().enumerate() {
        match distance(requester, &facility.location) {
            Ok(distance) if is_within_radius(distance, radius_km) => {
                outcome.matches.push(RankedMatch {
                    facility: facility.clone(),
                    distance_km: distance,
                });
            }
            Ok(_) => {}
            Err(fault) => {
                tracing::warn!(
                    facility = %facility.name,
                    index,
                    "Skipping facility: {}",
                    fault
                );
                outcome.skipped.push(SkippedCandidate {
                    name: facility.name.clone(),
                    index,
                });
            }
        }
    }

    // `sort_by` is stable; every distance here is finite
    outcome.matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    outcome
}
