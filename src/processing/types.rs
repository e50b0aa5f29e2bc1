use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Default speed (km/h) separating the "slow" and "fast" route colors.
pub const DEFAULT_SPEED_THRESHOLD_KMH: f64 = 25.0;

/// Default sideways distance between the route midpoint and the wind indicator.
pub const DEFAULT_INDICATOR_OFFSET_KM: f64 = 2.0;

/// Default length of the wind indicator line.
pub const DEFAULT_INDICATOR_LENGTH_KM: f64 = 1.5;

/// Conversion factor from meters per second to kilometers per hour.
pub const MPS_TO_KMH: f64 = 3.6;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting coordinates outside the WGS84 degree ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TrackProcessError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(TrackProcessError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Callers must guarantee the range invariant (used by the projection math,
    /// whose outputs are in range by construction).
    pub(crate) fn from_degrees_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Compass heading in degrees, normalized into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Bearing(f64);

impl Bearing {
    pub fn new(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
        if normalized >= 360.0 || !normalized.is_finite() {
            Bearing(0.0)
        } else {
            Bearing(normalized)
        }
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }

    /// Bearing rotated clockwise by `degrees`.
    pub fn rotated(&self, degrees: f64) -> Self {
        Bearing::new(self.0 + degrees)
    }
}

/// One ingested GPX point.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub position: GeoPoint,
    pub time: Option<DateTime<Utc>>,
    /// Instantaneous speed in meters per second, when the recorder provided one.
    pub speed: Option<f64>,
}

/// Ordered, non-empty sequence of points flattened from every track segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Result<Self, TrackProcessError> {
        if points.is_empty() {
            return Err(TrackProcessError::EmptyTrack);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a track built through [`Track::new`].
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn coordinates(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|point| point.position).collect()
    }

    pub fn timestamps(&self) -> Vec<Option<DateTime<Utc>>> {
        self.points.iter().map(|point| point.time).collect()
    }

    pub fn speeds(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|point| point.speed).collect()
    }

    pub fn first(&self) -> &TrackPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }
}

/// How absent speed readings enter the average and maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSpeedPolicy {
    /// Ignore points without a speed reading.
    #[default]
    Exclude,
    /// Count points without a speed reading as stationary.
    TreatAsZero,
}

/// Overview metrics derived from a [`Track`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackStatistics {
    pub total_distance_km: f64,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub duration_hours: f64,
    pub start_date: Option<NaiveDate>,
}

/// Start and end place names parsed from an "A-B" route name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLabel {
    pub from: String,
    pub to: String,
}

impl RouteLabel {
    pub fn unknown() -> Self {
        Self {
            from: "Unknown".into(),
            to: "Unknown".into(),
        }
    }
}

/// Geometry of the wind-direction arrow drawn beside the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindIndicator {
    pub bearing: Bearing,
    pub anchor: GeoPoint,
    pub line_end: GeoPoint,
}

/// Consecutive track segments sharing one speed class.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedRun {
    pub fast: bool,
    pub points: Vec<GeoPoint>,
}

/// User-facing knobs for a single pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    pub speed_threshold_kmh: f64,
    pub missing_speed: MissingSpeedPolicy,
    pub indicator_offset_km: f64,
    pub indicator_length_km: f64,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            speed_threshold_kmh: DEFAULT_SPEED_THRESHOLD_KMH,
            missing_speed: MissingSpeedPolicy::default(),
            indicator_offset_km: DEFAULT_INDICATOR_OFFSET_KM,
            indicator_length_km: DEFAULT_INDICATOR_LENGTH_KM,
        }
    }
}

impl ProcessingOptions {
    pub fn speed_threshold_mps(&self) -> f64 {
        self.speed_threshold_kmh / MPS_TO_KMH
    }

    /// Read a user-supplied threshold in km/h; only finite, non-negative values pass.
    pub fn parse_speed_threshold_kmh(raw: &str) -> Option<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|threshold| threshold.is_finite() && *threshold >= 0.0)
    }
}

/// Everything the map renderer needs from one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedTrack {
    pub track: Track,
    pub cumulative_distances: Vec<f64>,
    pub statistics: TrackStatistics,
    pub midpoint_index: usize,
    pub wind: WindIndicator,
    /// One entry per consecutive point pair; `true` when at or above the threshold.
    pub segment_classes: Vec<bool>,
    pub speed_runs: Vec<SpeedRun>,
    pub label: RouteLabel,
    pub options: ProcessingOptions,
}

impl ProcessedTrack {
    pub fn midpoint(&self) -> GeoPoint {
        self.track.points()[self.midpoint_index].position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackProcessError {
    ParseError(String),
    InvalidCoordinate { latitude: f64, longitude: f64 },
    MalformedSpeedValue(String),
    EmptyTrack,
    InsufficientPoints { required: usize, found: usize },
    NameParsing(String),
}

impl fmt::Display for TrackProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackProcessError::ParseError(msg) => write!(f, "Failed to decode GPX file: {msg}"),
            TrackProcessError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "Invalid coordinate: lat {latitude}, lon {longitude}"),
            TrackProcessError::MalformedSpeedValue(text) => {
                write!(f, "Speed value is not numeric: {text:?}")
            }
            TrackProcessError::EmptyTrack => write!(f, "GPX file contains no track points"),
            TrackProcessError::InsufficientPoints { required, found } => write!(
                f,
                "Track needs at least {required} points for this metric, found {found}"
            ),
            TrackProcessError::NameParsing(name) => {
                write!(f, "Route name {name:?} is not of the form Start-End")
            }
        }
    }
}

impl std::error::Error for TrackProcessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_rejects_out_of_range_values() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert_eq!(
            GeoPoint::new(91.0, 0.0),
            Err(TrackProcessError::InvalidCoordinate {
                latitude: 91.0,
                longitude: 0.0
            })
        );
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn bearing_normalizes_into_compass_range() {
        assert_eq!(Bearing::new(360.0).degrees(), 0.0);
        assert_eq!(Bearing::new(-90.0).degrees(), 270.0);
        assert_eq!(Bearing::new(450.0).degrees(), 90.0);
        assert!(Bearing::new(-1e-18).degrees() < 360.0);
        assert_eq!(Bearing::new(300.0).rotated(90.0).degrees(), 30.0);
    }

    #[test]
    fn empty_track_is_rejected() {
        assert_eq!(Track::new(Vec::new()), Err(TrackProcessError::EmptyTrack));
    }

    #[test]
    fn default_threshold_is_expressed_in_meters_per_second() {
        let options = ProcessingOptions::default();
        assert!((options.speed_threshold_mps() - 25.0 / 3.6).abs() < 1e-12);
    }

    #[test]
    fn speed_threshold_input_must_be_finite_and_non_negative() {
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh(" 30 "), Some(30.0));
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh("0"), Some(0.0));
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh("-5"), None);
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh("NaN"), None);
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh("inf"), None);
        assert_eq!(ProcessingOptions::parse_speed_threshold_kmh("windy"), None);
    }
}
