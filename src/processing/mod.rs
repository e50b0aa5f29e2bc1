pub mod display;
pub mod geodesy;
pub mod parse;
pub mod preprocess;
pub mod summary;
pub mod types;
pub mod wind;

use display::{classify_segments, group_speed_runs, route_label_or_unknown};
use parse::parse_gpx;
use preprocess::ingest_track;
use summary::{compute_cumulative_distances, compute_midpoint_index, compute_statistics};
use wind::estimate_wind;

pub use types::{
    Bearing, GeoPoint, MissingSpeedPolicy, ProcessedTrack, ProcessingOptions, RouteLabel,
    SpeedRun, Track, TrackPoint, TrackProcessError, TrackStatistics, WindIndicator,
};

/// Decode a GPX payload and compute everything the map needs.
///
/// The function performs four stages:
/// 1. [`parse::parse_gpx`] reads the XML into tracks, segments, and points.
/// 2. [`preprocess::ingest_track`] flattens them into one [`Track`], failing
///    with [`TrackProcessError::EmptyTrack`] when there is nothing to draw.
/// 3. [`summary`] derives the distance profile, statistics, and the
///    half-distance midpoint; [`wind`] derives the indicator geometry.
/// 4. [`display`] classifies segments by speed and resolves the route label.
///
/// `source_name` is the file name used for the "Start-End" label; when absent
/// the first track's `<name>` is tried instead.
pub fn process_gpx_bytes(
    bytes: &[u8],
    source_name: Option<&str>,
    options: &ProcessingOptions,
) -> Result<ProcessedTrack, TrackProcessError> {
    let document = parse_gpx(bytes)?;
    let track = ingest_track(&document)?;

    let cumulative_distances = compute_cumulative_distances(&track);
    let statistics = compute_statistics(&track, &cumulative_distances, options.missing_speed);
    let midpoint_index =
        compute_midpoint_index(&cumulative_distances, statistics.total_distance_km)?;
    let midpoint = track.points()[midpoint_index].position;
    let wind = estimate_wind(&track, midpoint, options);

    let segment_classes = classify_segments(&track, options.speed_threshold_mps());
    let speed_runs = group_speed_runs(&track, &segment_classes);

    let track_name = document.tracks.iter().find_map(|track| track.name.as_deref());
    let label = route_label_or_unknown(source_name.or(track_name));

    tracing::info!(
        points = track.len(),
        distance_km = statistics.total_distance_km,
        midpoint_index,
        "processed track"
    );

    Ok(ProcessedTrack {
        track,
        cumulative_distances,
        statistics,
        midpoint_index,
        wind,
        segment_classes,
        speed_runs,
        label,
        options: options.clone(),
    })
}
