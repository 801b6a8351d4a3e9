// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the emotion feed service.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Message shown when the backend cannot be read.
pub const LOAD_FAILED: &str = "Unable to load emotions. Please check your database configuration.";

/// Message shown when a submission could not be stored.
pub const SAVE_FAILED: &str = "Failed to save emotion. Please check your database configuration.";

/// Message shown when the submission limiter rejects a request.
pub const SHARED_TOO_OFTEN: &str =
    "You've shared too many emotions recently. Please wait a moment before sharing again.";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl AppError {
    /// Stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "INVALID_INPUT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Backend(_) | Self::Http(_) | Self::Url(_) => "BACKEND_UNAVAILABLE",
            Self::Config(_) => "CONFIGURATION",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message,
                    code: "INVALID_INPUT",
                    retry_after_secs: None,
                }),
            )
                .into_response(),
            Self::RateLimited { retry_after } => {
                let retry_secs = retry_after.as_secs().max(1);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_secs.to_string())],
                    Json(ErrorResponse {
                        error: SHARED_TOO_OFTEN.to_string(),
                        code: "RATE_LIMITED",
                        retry_after_secs: Some(retry_secs),
                    }),
                )
                    .into_response()
            }
            other => {
                // Backend details stay in the logs.
                tracing::warn!(error = %other, "Request failed against backend");
                let status = match other {
                    Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    Json(ErrorResponse {
                        error: SAVE_FAILED.to_string(),
                        code: other.code(),
                        retry_after_secs: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}
