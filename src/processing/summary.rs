use crate::processing::geodesy::great_circle_distance_km;
use crate::processing::types::{
    MPS_TO_KMH, MissingSpeedPolicy, Track, TrackProcessError, TrackStatistics,
};
use chrono::{DateTime, Utc};

/// Running distance (km) from the first point to every point of the track.
pub fn compute_cumulative_distances(track: &Track) -> Vec<f64> {
    let points = track.points();
    let mut distances = Vec::with_capacity(points.len());
    let mut total = 0.0;
    distances.push(total);

    for pair in points.windows(2) {
        if let [previous, current] = pair {
            total += great_circle_distance_km(previous.position, current.position);
            distances.push(total);
        }
    }

    distances
}

/// Index of the first point at or beyond half of `total_distance`.
pub fn compute_midpoint_index(
    profile: &[f64],
    total_distance: f64,
) -> Result<usize, TrackProcessError> {
    if profile.is_empty() {
        return Err(TrackProcessError::EmptyTrack);
    }
    if total_distance <= 0.0 {
        return Ok(0);
    }

    let half = total_distance / 2.0;
    Ok(profile
        .iter()
        .position(|distance| *distance >= half)
        .unwrap_or(profile.len() - 1))
}

/// Derive the overview numbers shown on the map.
///
/// `profile` must come from [`compute_cumulative_distances`] for the same
/// track; its last entry is the total distance.
pub fn compute_statistics(
    track: &Track,
    profile: &[f64],
    policy: MissingSpeedPolicy,
) -> TrackStatistics {
    let (average_speed_kmh, max_speed_kmh) = speed_summary_kmh(&track.speeds(), policy);
    let timestamps: Vec<DateTime<Utc>> = track.points().iter().filter_map(|p| p.time).collect();

    TrackStatistics {
        total_distance_km: profile.last().copied().unwrap_or(0.0),
        average_speed_kmh,
        max_speed_kmh,
        duration_hours: derive_duration_hours(&timestamps),
        start_date: timestamps.first().map(|time| time.date_naive()),
    }
}

/// Mean and maximum speed in km/h for speed samples given in m/s.
///
/// Returns zeros when no sample survives the policy.
pub fn speed_summary_kmh(speeds: &[Option<f64>], policy: MissingSpeedPolicy) -> (f64, f64) {
    let samples: Vec<f64> = match policy {
        MissingSpeedPolicy::Exclude => speeds.iter().flatten().copied().collect(),
        MissingSpeedPolicy::TreatAsZero => {
            speeds.iter().map(|speed| speed.unwrap_or(0.0)).collect()
        }
    };

    if samples.is_empty() {
        return (0.0, 0.0);
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (mean * MPS_TO_KMH, max * MPS_TO_KMH)
}

fn derive_duration_hours(timestamps: &[DateTime<Utc>]) -> f64 {
    match timestamps {
        [first, .., last] => {
            let seconds = (*last - *first).num_milliseconds() as f64 / 1000.0;
            seconds.max(0.0) / 3600.0
        }
        _ => {
            tracing::debug!(
                "{}; duration reported as 0",
                TrackProcessError::InsufficientPoints {
                    required: 2,
                    found: timestamps.len(),
                }
            );
            0.0
        }
    }
}
