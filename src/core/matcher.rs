use crate::core::error::LocatorError;
use crate::core::filters::rank_within_radius;
use crate::core::store::{LocationStore, SharedStore};
use crate::models::{Coordinate, MatchPolicy, MatchRequest, RankedMatch, SkippedCandidate};
use std::sync::Arc;

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matches: Vec<RankedMatch>,
    pub radius_km: f64,
    /// Facilities in the snapshot the request ran against
    pub considered: usize,
    pub skipped: Vec<SkippedCandidate>,
}

/// Entry point for nearby food bank searches
///
/// # Pipeline Stages
/// 1. Request validation (coordinate, radius)
/// 2. Store snapshot
/// 3. Distance evaluation and radius filter
/// 4. Stable ranking by distance, optional cap
///
/// Cloning is cheap and every clone reads the same shared store.
#[derive(Debug, Clone)]
pub struct MatchService {
    store: Arc<SharedStore>,
    policy: MatchPolicy,
}

impl MatchService {
    pub fn new(store: Arc<SharedStore>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    pub fn with_default_policy(store: LocationStore) -> Self {
        Self::new(Arc::new(SharedStore::new(store)), MatchPolicy::default())
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<SharedStore> {
        &self.store
    }

    /// Find facilities near the requester, nearest first
    ///
    /// Either the whole ranked list is returned or an error; an empty list
    /// means nothing lies within the radius.
    pub fn find_nearby(&self, request: &MatchRequest) -> Result<MatchResult, LocatorError> {
        let requester = Coordinate::new(request.latitude, request.longitude)?;
        let radius_km = self.resolve_radius(request)?;

        let snapshot = self.store.snapshot();
        let facilities = snapshot.all();

        let outcome = rank_within_radius(&requester, radius_km, facilities, self.policy.formula);

        let mut matches = outcome.matches;
        if let Some(cap) = self.policy.max_results {
            matches.truncate(cap);
        }

        tracing::debug!(
            requester = %requester,
            radius_km,
            considered = facilities.len(),
            matched = matches.len(),
            skipped = outcome.skipped.len(),
            "Nearby search complete"
        );

        Ok(MatchResult {
            matches,
            radius_km,
            considered: facilities.len(),
            skipped: outcome.skipped,
        })
    }

    fn resolve_radius(&self, request: &MatchRequest) -> Result<f64, LocatorError> {
        let radius_km = request.radius_km.unwrap_or(self.policy.default_radius_km);

        if radius_km.is_finite() && radius_km >= 0.0 {
            Ok(radius_km)
        } else {
            Err(LocatorError::InvalidRadius(radius_km))
        }
    }
}
