// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{gate::middleware::seamless_login, settings::GateSettings, state::AppState};

pub mod health;
pub mod settings;
pub mod site;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the service router. The seamless login gate wraps every route.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/v1/admin/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .fallback(site::site)
        .with_state(state.clone());

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(state, seamless_login))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        settings::get_settings,
        settings::update_settings
    ),
    components(
        schemas(
            GateSettings,
            settings::UpdateSettingsRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Admin", description = "Seamless login settings")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION},
            Request, StatusCode,
        },
    };
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    fn cilogon_state() -> AppState {
        let config = ServerConfig::from_lookup(|key| match key {
            "CILOGON_CLIENT_ID" => Some("cid".to_string()),
            "CILOGON_REDIRECT_URI" => {
                Some("https://a.access-ci.org/cilogon-auth/cilogon".to_string())
            }
            "ADMIN_TOKEN" => Some("secret".to_string()),
            _ => None,
        });
        AppState::from_config(&config)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = router(AppState::default())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn gate_runs_before_any_route() {
        let response = router(cilogon_state())
            .oneshot(
                Request::get("/health/live")
                    .header(COOKIE, "access_ci_sso=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().contains_key(LOCATION));
    }

    #[tokio::test]
    async fn admin_settings_round_trip_through_router() {
        let app = router(cilogon_state());

        let response = app
            .clone()
            .oneshot(
                Request::put("/v1/admin/settings")
                    .header(AUTHORIZATION, "Bearer secret")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"login_enabled":false}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let settings: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(settings["login_enabled"], false);

        // With seamless login off, the cookie holder is no longer redirected.
        let response = app
            .oneshot(
                Request::get("/")
                    .header(COOKIE, "access_ci_sso=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_settings_require_token() {
        let response = router(cilogon_state())
            .oneshot(Request::get("/v1/admin/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
