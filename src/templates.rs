use crate::processing::{GeoPoint, ProcessedTrack, TrackStatistics};
use serde_json::{Value, json};
use uuid::Uuid;

const SLOW_COLOR: &str = "blue";
const FAST_COLOR: &str = "red";
const WIND_COLOR: &str = "#0078A8";

fn format_distance(km: f64) -> String {
    format!("{km:.2} km")
}

fn format_duration(hours: f64) -> String {
    format!("{hours:.2} hours")
}

fn format_speed(kmh: f64) -> String {
    format!("{kmh:.2} km/h")
}

fn format_date(stats: &TrackStatistics) -> String {
    stats
        .start_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown Date".into())
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn lat_lng(point: GeoPoint) -> Value {
    json!([point.latitude(), point.longitude()])
}

/// South-west and north-east corners covering the route and the indicator.
fn bounds(points: impl Iterator<Item = GeoPoint>) -> Value {
    let (mut south, mut west, mut north, mut east) = (90.0_f64, 180.0_f64, -90.0_f64, -180.0_f64);
    for point in points {
        south = south.min(point.latitude());
        north = north.max(point.latitude());
        west = west.min(point.longitude());
        east = east.max(point.longitude());
    }
    json!([[south, west], [north, east]])
}

pub fn render_landing_page() -> String {
    include_str!("../templates/landing.html").to_string()
}

/// HTML snippet shown in the "Route Information" box at the route midpoint.
pub fn render_route_panel(processed: &ProcessedTrack) -> String {
    let stats = &processed.statistics;
    let mut panel = String::new();

    panel.push_str("<div class=\"route-panel\">");
    panel.push_str("<h4>Route Information</h4><hr>");
    panel.push_str("<p>");
    panel.push_str(&format!(
        "<strong>From:</strong> {}<br>",
        escape_html(&processed.label.from)
    ));
    panel.push_str(&format!(
        "<strong>To:</strong> {}<br>",
        escape_html(&processed.label.to)
    ));
    panel.push_str(&format!("<strong>Date:</strong> {}<br>", format_date(stats)));
    panel.push_str(&format!(
        "<strong>Distance:</strong> {}<br>",
        format_distance(stats.total_distance_km)
    ));
    panel.push_str(&format!(
        "<strong>Duration:</strong> {}<br>",
        format_duration(stats.duration_hours)
    ));
    panel.push_str(&format!(
        "<strong>Avg Speed:</strong> {}<br>",
        format_speed(stats.average_speed_kmh)
    ));
    panel.push_str(&format!(
        "<strong>Max Speed:</strong> {}",
        format_speed(stats.max_speed_kmh)
    ));
    panel.push_str("</p></div>");
    panel
}

fn map_payload(processed: &ProcessedTrack) -> Value {
    let track = &processed.track;
    let wind = &processed.wind;

    let runs: Vec<Value> = processed
        .speed_runs
        .iter()
        .map(|run| {
            let color = if run.fast { FAST_COLOR } else { SLOW_COLOR };
            let points: Vec<Value> = run.points.iter().map(|point| lat_lng(*point)).collect();
            json!({ "color": color, "points": points })
        })
        .collect();

    let covered = track
        .points()
        .iter()
        .map(|point| point.position)
        .chain([wind.anchor, wind.line_end]);

    json!({
        "bounds": bounds(covered),
        "start": lat_lng(track.first().position),
        "end": lat_lng(track.last().position),
        "runs": runs,
        "midpoint": lat_lng(processed.midpoint()),
        "panel": render_route_panel(processed),
        "wind": {
            "anchor": lat_lng(wind.anchor),
            "end": lat_lng(wind.line_end),
            "bearing": wind.bearing.degrees(),
            "color": WIND_COLOR,
        },
        "thresholdKmh": processed.options.speed_threshold_kmh,
    })
}

/// Standalone Leaflet page showing the route, markers, statistics, and the
/// wind indicator.
pub fn render_map_document(processed: &ProcessedTrack) -> String {
    let map_id = format!("map_{}", Uuid::new_v4().simple());
    // Keep "</script>" inside string values from closing the script block.
    let payload = map_payload(processed).to_string().replace("</", "<\\/");
    let title = format!(
        "{} to {}",
        escape_html(&processed.label.from),
        escape_html(&processed.label.to)
    );

    let mut page = String::new();
    page.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\" />");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />");
    page.push_str(&format!("<title>Surfr Route Map: {title}</title>"));
    page.push_str(
        "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\" />",
    );
    page.push_str("<script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>");
    page.push_str("<style>");
    page.push_str("html, body { height: 100%; margin: 0; }");
    page.push_str(&format!("#{map_id} {{ width: 100%; height: 100%; }}"));
    page.push_str(
        ".route-panel { background-color: #f9f9f9; border-radius: 6px; padding: 10px; \
         box-shadow: 0 0 10px rgba(0,0,0,0.5); width: 300px; transform: translateY(40px); \
         font-family: Arial, Helvetica, sans-serif; }",
    );
    page.push_str(".route-panel h4 { color: #0078A8; margin: 0; }");
    page.push_str(".route-panel hr { margin: 5px 0; }");
    page.push_str(".route-panel p { margin: 5px 0; font-size: 14px; color: #555; }");
    page.push_str(
        ".wind-label { font: bold 12px Arial, sans-serif; color: #0078A8; white-space: nowrap; }",
    );
    page.push_str("</style></head><body>");
    page.push_str(&format!("<div id=\"{map_id}\"></div>"));
    page.push_str("<script>");
    page.push_str(&format!("const data = {payload};"));
    page.push_str(&format!("const map = L.map('{map_id}');"));
    page.push_str(
        "L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', \
         { maxZoom: 19, attribution: '&copy; OpenStreetMap contributors' }).addTo(map);",
    );
    page.push_str("map.fitBounds(data.bounds, { padding: [20, 20] });");
    page.push_str(
        "data.runs.forEach(run => L.polyline(run.points, \
         { color: run.color, weight: 2.5, opacity: 1 }).addTo(map));",
    );
    page.push_str(
        "L.circleMarker(data.start, { radius: 8, color: 'green', fillOpacity: 0.9 })\
         .bindPopup('Start').addTo(map);",
    );
    page.push_str(
        "L.circleMarker(data.end, { radius: 8, color: 'red', fillOpacity: 0.9 })\
         .bindPopup('End').addTo(map);",
    );
    page.push_str(
        "L.marker(data.midpoint, { icon: L.divIcon({ html: data.panel, className: '', \
         iconSize: null }) }).addTo(map);",
    );
    page.push_str(
        "L.polyline([data.wind.anchor, data.wind.end], \
         { color: data.wind.color, weight: 4, dashArray: '6 4' }).addTo(map);",
    );
    page.push_str(
        "L.marker(data.wind.end, { icon: L.divIcon({ className: 'wind-label', iconSize: null, \
         html: '&#10148; wind ' + data.wind.bearing.toFixed(0) + '&deg;' }) }).addTo(map);",
    );
    page.push_str("</script></body></html>");
    page
}
