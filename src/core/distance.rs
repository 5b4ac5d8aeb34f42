use crate::models::{Coordinate, DistanceFormula};
use geo::{point, GeodesicDistance};
use thiserror::Error;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A distance evaluation that did not yield a usable number
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("distance computation produced {0}")]
pub struct DistanceFault(pub f64);

/// Distance in kilometers between two coordinates using `formula`
///
/// The pair is put in a canonical order first, so the result is the same
/// bit pattern whichever argument comes first. Identical points are
/// exactly zero apart.
pub fn distance_km(
    a: &Coordinate,
    b: &Coordinate,
    formula: DistanceFormula,
) -> Result<f64, DistanceFault> {
    if a == b {
        return Ok(0.0);
    }

    let (first, second) = canonical_order(a, b);
    let km = match formula {
        DistanceFormula::Geodesic => geodesic_distance(first, second),
        DistanceFormula::Haversine => haversine_distance(
            first.latitude(),
            first.longitude(),
            second.latitude(),
            second.longitude(),
        ),
    };

    if km.is_finite() && km >= 0.0 {
        Ok(km)
    } else {
        Err(DistanceFault(km))
    }
}

/// Ellipsoidal (WGS84) distance in kilometers
#[inline]
pub fn geodesic_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let p1 = point!(x: a.longitude(), y: a.latitude());
    let p2 = point!(x: b.longitude(), y: b.latitude());

    p1.geodesic_distance(&p2) / 1000.0
}

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points just past 1; NaN stays NaN
    let a = if a > 1.0 { 1.0 } else { a };
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[inline]
fn canonical_order<'a>(a: &'a Coordinate, b: &'a Coordinate) -> (&'a Coordinate, &'a Coordinate) {
    let key_a = (a.latitude(), a.longitude());
    let key_b = (b.latitude(), b.longitude());

    if key_a <= key_b {
        (a, b)
    } else {
        (b, a)
    }
}
