// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum middleware running the seamless login gate on every request.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .fallback(site)
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), seamless_login));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::{host_from_headers, AuthState, RawCookies, RequestContext};
use crate::session::Session;
use crate::settings::GateSettings;
use crate::state::AppState;

/// Run the gate, then either short-circuit with its redirect or continue.
pub async fn seamless_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = RawCookies::from_headers(request.headers());

    let mut session = match cookies.get(&state.session_cookie.name) {
        Some(id) => state.sessions.load(id).await,
        None => None,
    }
    .unwrap_or_else(Session::anonymous);

    let context = RequestContext {
        auth: if session.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        },
        route: state.routes.resolve(request.uri().path()).map(str::to_string),
        host: host_from_headers(request.headers()),
        cookies,
    };

    let settings = GateSettings::resolve(state.settings.as_ref());

    match state.gate.handle(&context, &settings, &mut session) {
        Ok(Some(redirect)) => {
            let cookie = state.session_cookie.header_value(&session.id);
            state.sessions.save(session).await;

            let mut response = redirect.into_response();
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session cookie is not a valid header value");
                }
            }
            response
        }
        Ok(None) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
