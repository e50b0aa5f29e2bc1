pub mod processing;
pub mod templates;

use axum::{
    Router,
    extract::Multipart,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use processing::{ProcessingOptions, TrackProcessError, process_gpx_bytes};
use templates::{render_landing_page, render_map_document};

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/upload", post(handle_upload))
}

async fn landing_page() -> Html<String> {
    Html(render_landing_page())
}

async fn handle_upload(mut multipart: Multipart) -> impl IntoResponse {
    let mut uploaded: Option<(Option<String>, Vec<u8>)> = None;
    let mut options = ProcessingOptions::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => {
                        uploaded = Some((file_name, bytes.to_vec()));
                    }
                    Err(err) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read uploaded file: {err}"),
                        )
                            .into_response();
                    }
                }
            }
            Some("speed_threshold_kmh") => {
                if let Ok(value) = field.text().await {
                    match ProcessingOptions::parse_speed_threshold_kmh(&value) {
                        Some(threshold) => {
                            options.speed_threshold_kmh = threshold;
                        }
                        None => {
                            return (
                                StatusCode::BAD_REQUEST,
                                format!("Invalid speed threshold: {value:?}"),
                            )
                                .into_response();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let (file_name, file_bytes) = match uploaded {
        Some(upload) => upload,
        None => return (StatusCode::BAD_REQUEST, "No file provided").into_response(),
    };

    match process_gpx_bytes(&file_bytes, file_name.as_deref(), &options) {
        Ok(processed) => Html(render_map_document(&processed)).into_response(),
        Err(err) => render_processing_error(err),
    }
}

fn render_processing_error(error: TrackProcessError) -> axum::response::Response {
    tracing::warn!("rejecting upload: {error}");
    (StatusCode::BAD_REQUEST, error.to_string()).into_response()
}
