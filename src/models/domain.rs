use crate::core::error::{LocatorError, SkipReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic position in decimal degrees
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180];
/// the only ways to obtain a value are [`Coordinate::new`] and
/// deserialization, which runs the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = LocatorError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocatorError> {
        if Self::in_range(latitude, longitude) {
            Ok(Self { latitude, longitude })
        } else {
            Err(LocatorError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// NaN fails both comparisons, so it is rejected too
    #[inline]
    pub fn in_range(latitude: f64, longitude: f64) -> bool {
        (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// One food bank / NGO location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityRecord {
    pub name: String,
    pub location: Coordinate,
    /// Every other source column, values untouched
    pub details: BTreeMap<String, String>,
}

impl FacilityRecord {
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            location,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Facility paired with its distance from the requester
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    #[serde(flatten)]
    pub facility: FacilityRecord,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Requester position plus an optional radius override
///
/// Latitude and longitude are kept raw here; the match service validates
/// them so that a bad request surfaces as `InvalidCoordinate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "radiusKm", default)]
    pub radius_km: Option<f64>,
}

impl MatchRequest {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km: None,
        }
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }
}

impl From<Coordinate> for MatchRequest {
    fn from(coordinate: Coordinate) -> Self {
        Self::new(coordinate.latitude(), coordinate.longitude())
    }
}

/// Source row left out of the store at load time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the source, header included
    pub line: u64,
    pub name: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Facility left out of a single match because its distance faulted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCandidate {
    pub name: String,
    pub index: usize,
}

/// Distance formula used by the evaluator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceFormula {
    /// WGS84 ellipsoid, Karney's algorithm
    #[default]
    Geodesic,
    /// Sphere of mean Earth radius
    Haversine,
}

/// Matching policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    pub default_radius_km: f64,
    pub max_results: Option<usize>,
    pub formula: DistanceFormula,
}

pub const DEFAULT_RADIUS_KM: f64 = 50.0;

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            max_results: None,
            formula: DistanceFormula::Geodesic,
        }
    }
}
