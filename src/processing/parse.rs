use crate::processing::types::TrackProcessError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Raw GPX content, kept as close to the file layout as the pipeline needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxDocument {
    pub tracks: Vec<GpxTrack>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub segments: Vec<GpxSegment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxSegment {
    pub points: Vec<GpxPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpxPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// `<time>` text as written in the file; parsed during ingestion.
    pub time: Option<String>,
    pub extensions: Vec<ExtensionField>,
}

/// A leaf element found anywhere below a point's `<extensions>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionField {
    /// Qualified tag name, e.g. `gpxtpx:speed`.
    pub tag: String,
    pub text: String,
}

impl GpxDocument {
    pub fn point_count(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|track| &track.segments)
            .map(|segment| segment.points.len())
            .sum()
    }

    fn current_segment_mut(&mut self) -> &mut GpxSegment {
        if self.tracks.is_empty() {
            self.tracks.push(GpxTrack::default());
        }
        let track_idx = self.tracks.len() - 1;
        let track = &mut self.tracks[track_idx];
        if track.segments.is_empty() {
            track.segments.push(GpxSegment::default());
        }
        let segment_idx = track.segments.len() - 1;
        &mut track.segments[segment_idx]
    }

    fn current_point_mut(&mut self) -> Option<&mut GpxPoint> {
        self.tracks
            .last_mut()
            .and_then(|track| track.segments.last_mut())
            .and_then(|segment| segment.points.last_mut())
    }
}

#[derive(Debug)]
struct ExtensionFrame {
    tag: String,
    text: String,
    has_children: bool,
}

/// Tracks where the reader is inside the document between events.
#[derive(Debug, Default)]
struct ReaderState {
    path: Vec<String>,
    extension_frames: Vec<ExtensionFrame>,
    text: String,
}

impl ReaderState {
    fn inside_point_extensions(&self) -> bool {
        match self.path.iter().rposition(|name| name == "trkpt") {
            Some(idx) => self.path[idx + 1..].iter().any(|name| name == "extensions"),
            None => false,
        }
    }

    fn open(
        &mut self,
        element: &BytesStart<'_>,
        document: &mut GpxDocument,
    ) -> Result<(), TrackProcessError> {
        let local = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();

        if self.inside_point_extensions() {
            if let Some(parent) = self.extension_frames.last_mut() {
                parent.has_children = true;
            }
            self.extension_frames.push(ExtensionFrame {
                tag: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
                text: String::new(),
                has_children: false,
            });
            self.path.push(local);
            return Ok(());
        }

        match local.as_str() {
            "trk" => document.tracks.push(GpxTrack::default()),
            "trkseg" => {
                if document.tracks.is_empty() {
                    document.tracks.push(GpxTrack::default());
                }
                let idx = document.tracks.len() - 1;
                document.tracks[idx].segments.push(GpxSegment::default());
            }
            "trkpt" => {
                let point = point_from_attributes(element)?;
                document.current_segment_mut().points.push(point);
            }
            _ => {}
        }

        self.path.push(local);
        self.text.clear();
        Ok(())
    }

    fn text(&mut self, text: &str) {
        match self.extension_frames.last_mut() {
            Some(frame) => frame.text.push_str(text),
            None => self.text.push_str(text),
        }
    }

    fn close(&mut self, document: &mut GpxDocument) {
        let closed = self.path.pop();

        if let Some(frame) = self.extension_frames.pop() {
            if !frame.has_children {
                if let Some(point) = document.current_point_mut() {
                    point.extensions.push(ExtensionField {
                        tag: frame.tag,
                        text: frame.text.trim().to_string(),
                    });
                }
            }
            return;
        }

        let parent = self.path.last().map(String::as_str);
        match (closed.as_deref(), parent) {
            (Some("time"), Some("trkpt")) => {
                let time = self.text.trim().to_string();
                if let Some(point) = document.current_point_mut() {
                    point.time = Some(time);
                }
            }
            (Some("name"), Some("trk")) => {
                let name = self.text.trim().to_string();
                if let Some(track) = document.tracks.last_mut() {
                    if !name.is_empty() {
                        track.name = Some(name);
                    }
                }
            }
            _ => {}
        }
        self.text.clear();
    }
}

fn point_from_attributes(element: &BytesStart<'_>) -> Result<GpxPoint, TrackProcessError> {
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|err| TrackProcessError::ParseError(err.to_string()))?;
        let value = attribute
            .unescape_value()
            .map_err(|err| TrackProcessError::ParseError(err.to_string()))?;

        match attribute.key.as_ref() {
            b"lat" => latitude = Some(parse_coordinate("lat", &value)?),
            b"lon" => longitude = Some(parse_coordinate("lon", &value)?),
            _ => {}
        }
    }

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(GpxPoint {
            latitude,
            longitude,
            time: None,
            extensions: Vec::new(),
        }),
        _ => Err(TrackProcessError::ParseError(
            "trkpt is missing its lat/lon attributes".into(),
        )),
    }
}

fn parse_coordinate(name: &str, raw: &str) -> Result<f64, TrackProcessError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| {
            TrackProcessError::ParseError(format!("{name} attribute {raw:?} is not a number"))
        })
}

/// Read a GPX document into tracks, segments, and points.
///
/// Only track points are collected; routes and waypoints are ignored. Every
/// leaf element under a point's `<extensions>` is kept so ingestion can look
/// for speed readings regardless of which vendor namespace wrote them.
pub fn parse_gpx(bytes: &[u8]) -> Result<GpxDocument, TrackProcessError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut document = GpxDocument::default();
    let mut state = ReaderState::default();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(err) => {
                return Err(TrackProcessError::ParseError(format!(
                    "error at position {}: {err}",
                    reader.buffer_position()
                )));
            }
            Ok(event) => event,
        };

        match event {
            Event::Start(ref element) => state.open(element, &mut document)?,
            Event::Empty(ref element) => {
                state.open(element, &mut document)?;
                state.close(&mut document);
            }
            Event::Text(ref text) => {
                let text = text
                    .unescape()
                    .map_err(|err| TrackProcessError::ParseError(err.to_string()))?;
                state.text(&text);
            }
            Event::CData(ref data) => state.text(&String::from_utf8_lossy(data)),
            Event::End(_) => state.close(&mut document),
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(document)
}
