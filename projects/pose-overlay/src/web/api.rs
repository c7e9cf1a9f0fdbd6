use crate::pipeline::PipelineError;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;

pub const UPLOAD_FIELD: &str = "file";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Pull the `file` field out of the form. A missing field is treated like a missing filename.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;
        return Ok(Upload { file_name, bytes });
    }

    Err(ApiError::from_pipeline(
        PipelineError::invalid_request("No selected file"),
        true,
    ))
}

pub async fn process_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(&mut multipart).await?;
    let expose = state.expose_error_details;

    let pipeline = state.pipeline.clone();
    let processed =
        tokio::task::spawn_blocking(move || pipeline.handle(&upload.file_name, &upload.bytes))
            .await
            .map_err(|e| ApiError::internal("Processing task failed", e, expose))?
            .map_err(|e| ApiError::from_pipeline(e, expose))?;

    let body = tokio::fs::read(&processed.path)
        .await
        .map_err(|e| ApiError::from_pipeline(PipelineError::storage(e), expose))?;

    tracing::info!(
        request_id = %processed.request_id,
        frames = processed.frames,
        bytes = body.len(),
        "Responding with {}",
        processed.download_name
    );

    // Unretained artifacts are removed when `processed` drops
    video_response(body, &processed.download_name, expose)
}

/// GET on the upload route answers 200 with a message instead of 405.
pub async fn process_get() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "GET method is not allowed".to_string(),
    })
}

fn video_response(
    body: Vec<u8>,
    download_name: &str,
    expose: bool,
) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, content_disposition(download_name))
        .body(Body::from(body))
        .map_err(|e| ApiError::internal("Failed to build response", e, expose))
}

/// `attachment` disposition; non-ASCII names use the RFC 5987 `filename*` form.
pub fn content_disposition(file_name: &str) -> HeaderValue {
    if file_name.is_ascii() && !file_name.chars().any(|c| c.is_ascii_control()) {
        let quoted = file_name.replace('\\', "\\\\").replace('"', "\\\"");
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", quoted)) {
            return value;
        }
    }

    let encoded = urlencoding::encode(file_name);
    HeaderValue::from_str(&format!("attachment; filename*=utf-8''{}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
