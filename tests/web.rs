use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use surfrmap::build_app;
use tower::ServiceExt;

const BOUNDARY: &str = "surfrboundary";

fn multipart_body(file_name: &str, gpx: &[u8], threshold: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/gpx+xml\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(gpx);
    body.extend_from_slice(b"\r\n");

    if let Some(threshold) = threshold {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"speed_threshold_kmh\"\r\n\r\n{threshold}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn landing_page_responds() {
    let app = build_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Surfr Route Map"));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "multipart/form-data; boundary=--boundary")
        .body(Body::from("----boundary--"))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploaded_track_is_rendered_as_map() {
    let gpx = std::fs::read("tests/fixtures/Vilanova-Torredembarra.gpx")
        .expect("fixture should be present");
    let app = build_app();

    let response = app
        .oneshot(upload_request(multipart_body(
            "Vilanova-Torredembarra.gpx",
            &gpx,
            Some("30"),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("leaflet"));
    assert!(html.contains("Torredembarra"));
    assert!(html.contains("\"thresholdKmh\":30.0"));
}

#[tokio::test]
async fn empty_track_upload_reports_the_error() {
    let gpx = std::fs::read("tests/fixtures/empty.gpx").expect("fixture should be present");
    let app = build_app();

    let response = app
        .oneshot(upload_request(multipart_body("empty.gpx", &gpx, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("no track points"));
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let gpx = std::fs::read("tests/fixtures/Vilanova-Torredembarra.gpx")
        .expect("fixture should be present");
    let app = build_app();

    let response = app
        .oneshot(upload_request(multipart_body(
            "Vilanova-Torredembarra.gpx",
            &gpx,
            Some("windy"),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
