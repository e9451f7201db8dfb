// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin endpoints for the seamless login settings.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    auth::AdminOnly,
    error::ApiError,
    settings::{GateSettings, COOKIE_DEBUG_KEY, COOKIE_NAME_KEY, LOGIN_ENABLED_KEY},
    state::AppState,
};

/// Partial update of the seamless settings. Omitted fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub login_enabled: Option<bool>,
    pub cookie_debug: Option<bool>,
    pub cookie_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/admin/settings",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current seamless login settings", body = GateSettings),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 403, description = "Admin API disabled"),
    )
)]
pub async fn get_settings(_admin: AdminOnly, State(state): State<AppState>) -> Json<GateSettings> {
    Json(GateSettings::resolve(state.settings.as_ref()))
}

#[utoipa::path(
    put,
    path = "/v1/admin/settings",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings after the update", body = GateSettings),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 403, description = "Admin API disabled"),
        (status = 422, description = "Invalid cookie name"),
    )
)]
pub async fn update_settings(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<GateSettings>, ApiError> {
    if let Some(name) = &request.cookie_name {
        validate_cookie_name(name)?;
    }

    let store = state.settings.as_ref();
    if let Some(enabled) = request.login_enabled {
        store.set(LOGIN_ENABLED_KEY, Value::Bool(enabled));
    }
    if let Some(debug) = request.cookie_debug {
        store.set(COOKIE_DEBUG_KEY, Value::Bool(debug));
    }
    if let Some(name) = request.cookie_name {
        store.set(COOKIE_NAME_KEY, Value::String(name));
    }

    let settings = GateSettings::resolve(store);
    tracing::info!(
        login_enabled = settings.login_enabled,
        cookie_debug = settings.cookie_debug,
        cookie_name = %settings.cookie_name,
        "Seamless login settings updated"
    );
    Ok(Json(settings))
}

/// Cookie names are RFC 6265 tokens.
fn validate_cookie_name(name: &str) -> Result<(), ApiError> {
    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(&c));
    if valid {
        Ok(())
    } else {
        Err(ApiError::unprocessable(format!("invalid cookie name: {name:?}")))
    }
}
