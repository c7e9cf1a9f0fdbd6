//! HTTP error responses: `{"detail": "..."}` with the taxonomy's status.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::PipelineError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Logs the full diagnostic; the response only carries it when `expose_details` is set.
    pub fn from_pipeline(err: PipelineError, expose_details: bool) -> Self {
        if err.is_client_error() {
            tracing::warn!(kind = err.kind(), "{}", err);
            return Self {
                status: StatusCode::BAD_REQUEST,
                detail: err.to_string(),
            };
        }

        tracing::error!(kind = err.kind(), "{}", err);
        let detail = if expose_details {
            err.to_string()
        } else {
            err.summary()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail,
        }
    }

    pub fn from_multipart(err: MultipartError) -> Self {
        tracing::warn!("Rejected multipart upload: {}", err);
        Self {
            status: err.status(),
            detail: err.body_text(),
        }
    }

    /// 500 for failures outside the pipeline taxonomy, such as a panicked
    /// worker task or a response that could not be assembled.
    pub fn internal(prefix: &str, err: impl std::fmt::Display, expose_details: bool) -> Self {
        tracing::error!("{}: {}", prefix, err);
        let detail = if expose_details {
            format!("{}: {}", prefix, err)
        } else {
            prefix.to_string()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}
