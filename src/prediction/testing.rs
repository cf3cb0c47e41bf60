// In-process stand-in for the remote prediction service.
//
// The response is chosen from the uploaded file contents:
//   "FAIL"  => 500 with a plain-text error
//   "ARRAY" => 200 with a JSON array (not an object)
//   "SLOW"  => 200 after a 400 ms delay
//   other   => 200 with a prediction object echoing the file name

use std::time::Duration;

use axum::{
    extract::Multipart,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

pub(crate) const SLOW_DELAY: Duration = Duration::from_millis(400);

async fn predict(mut multipart: Multipart) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            file = Some((name, bytes.to_vec()));
        }
    }

    let Some((name, bytes)) = file else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "missing file field").into_response();
    };
    let text = String::from_utf8_lossy(&bytes);

    if text.contains("FAIL") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model exploded").into_response();
    }
    if text.contains("ARRAY") {
        return json_response("[1, 2, 3]".to_string());
    }
    if text.contains("SLOW") {
        tokio::time::sleep(SLOW_DELAY).await;
    }

    let body = serde_json::json!({
        "predictions": [100.1, 101.2],
        "y_test": [99.8, 100.5],
        "dates": ["2025-07-20", "2025-07-21"],
        "file_name": name,
    });
    json_response(body.to_string())
}

fn json_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Start the fake service on an ephemeral port and return its base URL.
pub(crate) async fn fake_service() -> String {
    let app = Router::new().route("/api/v1/predict", post(predict));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake prediction service");
    let addr = listener.local_addr().expect("fake service address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// A base URL that refuses connections.
pub(crate) async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{addr}")
}
