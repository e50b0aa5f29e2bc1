//! Spherical-earth helpers: haversine distance, initial bearing, and
//! destination-point projection.
//!
//! Every function here uses the same mean Earth radius so that projecting a
//! point and measuring the distance back agree.

use crate::processing::types::{Bearing, GeoPoint};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally past 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial compass bearing from `a` towards `b`.
///
/// Identical points have no defined heading; they yield a bearing of 0.
pub fn bearing_degrees(a: GeoPoint, b: GeoPoint) -> Bearing {
    if a == b {
        return Bearing::new(0.0);
    }

    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let x = d_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    Bearing::new(x.atan2(y).to_degrees())
}

/// Point reached by travelling `distance_km` from `origin` along `bearing_deg`.
///
/// A negative distance travels the opposite way.
pub fn destination_point(origin: GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
    let lat1 = origin.latitude().to_radians();
    let lon1 = origin.longitude().to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let sin_lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos())
        .clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * sin_lat2);

    GeoPoint::from_degrees_unchecked(
        lat2.to_degrees().clamp(-90.0, 90.0),
        normalize_longitude(lon2.to_degrees()),
    )
}

fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped < -180.0 { -180.0 } else { wrapped }
}
