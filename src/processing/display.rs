use crate::processing::types::{RouteLabel, SpeedRun, Track, TrackProcessError};
use std::path::Path;

/// Classify every consecutive pair of points against `threshold_mps`.
///
/// A segment takes the speed recorded at its starting point; a point without
/// a reading counts as below the threshold.
pub fn classify_segments(track: &Track, threshold_mps: f64) -> Vec<bool> {
    track
        .points()
        .windows(2)
        .map(|pair| pair[0].speed.is_some_and(|speed| speed >= threshold_mps))
        .collect()
}

/// Merge consecutive segments of the same class into polylines.
///
/// Adjacent runs share their boundary point so the drawn route has no gaps.
pub fn group_speed_runs(track: &Track, classes: &[bool]) -> Vec<SpeedRun> {
    let points = track.points();
    let mut runs: Vec<SpeedRun> = Vec::new();

    for (idx, &fast) in classes.iter().enumerate() {
        let (Some(start), Some(end)) = (points.get(idx), points.get(idx + 1)) else {
            break;
        };

        match runs.last_mut() {
            Some(run) if run.fast == fast => run.points.push(end.position),
            _ => runs.push(SpeedRun {
                fast,
                points: vec![start.position, end.position],
            }),
        }
    }

    runs
}

/// Split an "Start-End" route name, e.g. `GPX_data/Vilanova-Torredembarra.gpx`.
pub fn parse_route_label(name: &str) -> Result<RouteLabel, TrackProcessError> {
    let stem = Path::new(name.trim())
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or(name);
    let stem = stem
        .strip_suffix(".gpx")
        .or_else(|| stem.strip_suffix(".GPX"))
        .unwrap_or(stem);

    let parts: Vec<&str> = stem.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [from, to] if !from.is_empty() && !to.is_empty() => Ok(RouteLabel {
            from: (*from).to_string(),
            to: (*to).to_string(),
        }),
        _ => Err(TrackProcessError::NameParsing(name.to_string())),
    }
}

/// Label for the map header; falls back to "Unknown" without failing the run.
pub fn route_label_or_unknown(name: Option<&str>) -> RouteLabel {
    let Some(name) = name else {
        return RouteLabel::unknown();
    };

    match parse_route_label(name) {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!("{err}; using unknown start and end");
            RouteLabel::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::types::{GeoPoint, TrackPoint};

    fn track_with_speeds(speeds: &[Option<f64>]) -> Track {
        Track::new(
            speeds
                .iter()
                .enumerate()
                .map(|(idx, &speed)| TrackPoint {
                    position: GeoPoint::new(0.0, idx as f64 * 0.01).expect("in range"),
                    time: None,
                    speed,
                })
                .collect(),
        )
        .expect("non-empty")
    }

    #[test]
    fn segments_compare_starting_speed_with_threshold() {
        let track = track_with_speeds(&[Some(2.0), Some(7.0), None, Some(6.9), Some(1.0)]);
        let classes = classify_segments(&track, 7.0);
        assert_eq!(classes, vec![false, true, false, false]);
    }

    #[test]
    fn single_point_track_has_no_segments() {
        let track = track_with_speeds(&[Some(10.0)]);
        assert!(classify_segments(&track, 1.0).is_empty());
        assert!(group_speed_runs(&track, &[]).is_empty());
    }

    #[test]
    fn runs_share_boundary_points() {
        let track = track_with_speeds(&[Some(1.0), Some(1.0), Some(9.0), Some(9.0), Some(1.0)]);
        let classes = classify_segments(&track, 5.0);
        let runs = group_speed_runs(&track, &classes);

        assert_eq!(classes, vec![false, false, true, true]);
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].fast);
        assert_eq!(runs[0].points.len(), 3);
        assert!(runs[1].fast);
        assert_eq!(runs[1].points.len(), 3);
        assert_eq!(runs[0].points.last(), runs[1].points.first());
    }

    #[test]
    fn route_label_from_file_name() {
        assert_eq!(
            parse_route_label("GPX_data/Vilanova-Torredembarra.gpx"),
            Ok(RouteLabel {
                from: "Vilanova".into(),
                to: "Torredembarra".into()
            })
        );
        assert_eq!(
            parse_route_label("Sitges - Garraf").map(|label| label.to),
            Ok("Garraf".to_string())
        );
    }

    #[test]
    fn route_label_needs_exactly_two_parts() {
        for name in ["Ride.gpx", "A-B-C.gpx", "-End.gpx", ""] {
            assert_eq!(
                parse_route_label(name),
                Err(TrackProcessError::NameParsing(name.to_string())),
                "{name}"
            );
        }
        assert_eq!(route_label_or_unknown(Some("Ride.gpx")), RouteLabel::unknown());
        assert_eq!(route_label_or_unknown(None), RouteLabel::unknown());
    }
}
