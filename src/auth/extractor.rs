// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor guarding the admin API.
//!
//! ```rust,ignore
//! async fn update_settings(_admin: AdminOnly, State(state): State<AppState>) { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};

use super::AuthError;
use crate::state::AppState;

/// Proof that the request carried the configured admin bearer token.
pub struct AdminOnly;

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.admin_token.as_deref().ok_or(AuthError::AdminDisabled)?;

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?
            .trim();

        if !tokens_match(token, expected) {
            tracing::warn!("Rejected admin request with invalid token");
            return Err(AuthError::InvalidToken);
        }

        Ok(AdminOnly)
    }
}

/// Compare fixed-length digests so the comparison time does not depend on
/// where the tokens first differ.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
