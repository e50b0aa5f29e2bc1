use crate::processing::parse::{ExtensionField, GpxDocument, GpxPoint};
use crate::processing::types::{GeoPoint, Track, TrackPoint, TrackProcessError};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Tag suffix identifying a speed reading among a point's extension fields.
const SPEED_TAG_SUFFIX: &str = "speed";

/// `xsd:dateTime` without a zone designator; such times are read as UTC.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Flatten every segment of every track into one [`Track`].
///
/// Points keep their source order and segment boundaries are dropped, so the
/// gap between two segments counts like any other pair of points. Values that
/// cannot be read (speed text, timestamps) are logged and left empty rather
/// than failing the whole file.
pub fn ingest_track(document: &GpxDocument) -> Result<Track, TrackProcessError> {
    let mut points = Vec::with_capacity(document.point_count());

    for raw in document
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|segment| &segment.points)
    {
        points.push(normalize_point(raw)?);
    }

    let track = Track::new(points)?;
    tracing::debug!(points = track.len(), "ingested track");
    Ok(track)
}

fn normalize_point(raw: &GpxPoint) -> Result<TrackPoint, TrackProcessError> {
    Ok(TrackPoint {
        position: GeoPoint::new(raw.latitude, raw.longitude)?,
        time: raw.time.as_deref().and_then(parse_timestamp),
        speed: extract_speed(&raw.extensions),
    })
}

/// First numeric value among the fields whose tag ends with `speed`.
///
/// Non-numeric values are reported and skipped; later speed fields still get
/// a chance.
pub fn extract_speed(extensions: &[ExtensionField]) -> Option<f64> {
    for field in extensions
        .iter()
        .filter(|field| field.tag.ends_with(SPEED_TAG_SUFFIX))
    {
        match parse_speed(&field.text) {
            Ok(speed) => return Some(speed),
            Err(err) => tracing::warn!(tag = %field.tag, "{err}"),
        }
    }
    None
}

fn parse_speed(text: &str) -> Result<f64, TrackProcessError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| TrackProcessError::MalformedSpeedValue(text.to_string()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            tracing::warn!(value = raw, "ignoring unreadable timestamp: {err}");
            None
        }
    }
}
