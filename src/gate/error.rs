// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gate errors.
//!
//! The gate never recovers from collaborator failures; they surface as a
//! 500 response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("configuration `{0}` is not set")]
    MissingConfig(String),

    #[error("invalid OAuth client settings: {0}")]
    InvalidClientSettings(#[from] serde_json::Error),

    #[error("unknown OAuth client `{0}`")]
    UnknownClient(String),

    #[error("invalid authorization URL: {0}")]
    InvalidAuthorizationUrl(#[from] url::ParseError),
}

#[derive(Serialize)]
struct GateErrorBody {
    error: String,
    error_code: String,
}

impl GateError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GateError::MissingConfig(_) => "missing_config",
            GateError::InvalidClientSettings(_) => "invalid_client_settings",
            GateError::UnknownClient(_) => "unknown_client",
            GateError::InvalidAuthorizationUrl(_) => "invalid_authorization_url",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Seamless login gate failed");
        let body = Json(GateErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
