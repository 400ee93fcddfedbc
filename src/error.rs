// Error taxonomy shared by the search pipeline and the HTTP layer

use crate::export::ExportError;
use crate::provider::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Startup configuration problems. These abort the process.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no usable YouTube API keys configured (set YOUTUBE_API_KEY_1..N)")]
    NoCredentials,
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("YouTube API daily quota exceeded ({exhausted}/{total} keys exhausted)")]
    PoolExhausted {
        total: usize,
        available: usize,
        exhausted: usize,
    },
    #[error("YouTube API key rejected: {0}")]
    InvalidCredential(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl SearchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::PoolExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
            SearchError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            SearchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::Provider(_) | SearchError::Export(_) | SearchError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable discriminator sent as `errorType`.
    pub fn error_type(&self) -> &'static str {
        match self {
            SearchError::PoolExhausted { .. } => "quota_exceeded",
            SearchError::InvalidCredential(_) => "invalid_api_key",
            SearchError::BadRequest(_) => "bad_request",
            _ => "general_error",
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            SearchError::PoolExhausted {
                total,
                available,
                exhausted,
            } => {
                let details = if *available > 0 {
                    format!("{} more API key(s) are still available.", available)
                } else {
                    "All API keys have exhausted their quota. Quota resets daily.".to_string()
                };
                json!({
                    "success": false,
                    "error": self.to_string(),
                    "errorType": self.error_type(),
                    "details": details,
                    "keyStats": {
                        "total": total,
                        "available": available,
                        "exhausted": exhausted
                    }
                })
            }
            SearchError::InvalidCredential(_) => json!({
                "success": false,
                "error": "The configured YouTube API key is invalid. Contact the administrator.",
                "errorType": self.error_type()
            }),
            _ => json!({
                "success": false,
                "error": self.to_string(),
                "errorType": self.error_type()
            }),
        };

        match status.as_u16() {
            500..=599 => tracing::error!(error = %self, "search request failed"),
            _ => tracing::warn!(error = %self, "search request rejected"),
        }

        (status, Json(body)).into_response()
    }
}
