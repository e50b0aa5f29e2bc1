//! Wind-direction indicator placed beside the route.
//!
//! Downwind runs roughly follow the wind, so the straight start-to-end heading
//! of the session stands in for the wind direction.

use crate::processing::geodesy::{bearing_degrees, destination_point};
use crate::processing::types::{Bearing, GeoPoint, ProcessingOptions, Track, WindIndicator};

/// Heading from the first to the last point, ignoring the path in between.
pub fn estimate_bearing(track: &Track) -> Bearing {
    bearing_degrees(track.first().position, track.last().position)
}

/// Point `lateral_offset_km` to the right of `midpoint` when facing `bearing`.
///
/// A negative offset places the anchor on the left.
pub fn compute_indicator_anchor(
    midpoint: GeoPoint,
    bearing: Bearing,
    lateral_offset_km: f64,
) -> GeoPoint {
    destination_point(midpoint, bearing.rotated(90.0).degrees(), lateral_offset_km)
}

pub fn compute_indicator_line_end(anchor: GeoPoint, bearing: Bearing, length_km: f64) -> GeoPoint {
    destination_point(anchor, bearing.degrees(), length_km)
}

pub fn estimate_wind(
    track: &Track,
    midpoint: GeoPoint,
    options: &ProcessingOptions,
) -> WindIndicator {
    let bearing = estimate_bearing(track);
    let anchor = compute_indicator_anchor(midpoint, bearing, options.indicator_offset_km);
    let line_end = compute_indicator_line_end(anchor, bearing, options.indicator_length_km);

    tracing::debug!(bearing = bearing.degrees(), "estimated wind direction");

    WindIndicator {
        bearing,
        anchor,
        line_end,
    }
}
