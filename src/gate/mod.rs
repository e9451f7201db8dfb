// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Seamless Login Gate
//!
//! Decides, once per request, whether an anonymous visitor should be sent
//! straight into the CILogon authorization flow.
//!
//! ## Decision Order
//!
//! 1. Seamless login disabled: do nothing.
//! 2. Look up the shared cookie in the raw request cookies.
//! 3. Authenticated session: do nothing. A missing cookie on a federated host
//!    outside the login/logout routes means the user logged out on a sibling
//!    subdomain, but forcing a local logout is deliberately left switched off.
//! 4. Anonymous session: if the CILogon client is installed and the cookie is
//!    present, mark the session with `cilogon_auth_op = login` and redirect to
//!    the client's authorization URL.
//!
//! Collaborators are injected as traits so the gate itself performs no I/O.

pub mod context;
pub mod error;
pub mod federation;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{
        header::{CACHE_CONTROL, LOCATION},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::session::{Session, OP_SESSION_KEY};
use crate::settings::GateSettings;

pub use context::{AuthState, RawCookies, RequestContext};
pub use error::GateError;
pub use federation::FederationDomains;
pub use routes::RouteTable;

/// Name under which the CILogon client capability is registered.
pub const CILOGON_AUTH_MODULE: &str = "cilogon_auth";
/// Client id of the CILogon OAuth client.
pub const CILOGON_CLIENT: &str = "cilogon";

/// Tracing target for gate diagnostics.
const LOG_TARGET: &str = "seamless_cilogon";

/// Configuration name holding the settings blob for `client_id`.
pub fn client_config_name(client_id: &str) -> String {
    format!("{CILOGON_AUTH_MODULE}.settings.{client_id}")
}

/// Answers whether an optional capability is installed.
pub trait ModuleAvailability: Send + Sync {
    fn module_exists(&self, name: &str) -> bool;
}

/// Named configuration lookup.
pub trait ConfigProvider: Send + Sync {
    fn get_config(&self, name: &str) -> Option<Value>;
}

/// Source of the OAuth scopes to request.
pub trait ClaimsProvider: Send + Sync {
    fn scopes(&self) -> Vec<String>;
}

/// An OAuth client able to start an authorization request.
pub trait OAuthClient: Send {
    fn authorize(
        &self,
        scopes: &[String],
        session: &mut Session,
    ) -> Result<AuthorizationRedirect, GateError>;
}

/// Builds OAuth clients from their settings blob.
pub trait OAuthClientFactory: Send + Sync {
    fn create_client(
        &self,
        client_id: &str,
        settings: &Value,
    ) -> Result<Box<dyn OAuthClient>, GateError>;
}

/// Whether a host belongs to the cooperating set of subdomains.
pub trait FederationCheck: Send + Sync {
    fn is_federated(&self, host: Option<&str>) -> bool;
}

/// Redirect into the identity provider's authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    pub location: Url,
}

impl IntoResponse for AuthorizationRedirect {
    fn into_response(self) -> Response {
        let mut response = StatusCode::FOUND.into_response();
        let headers = response.headers_mut();
        match HeaderValue::from_str(self.location.as_str()) {
            Ok(location) => {
                headers.insert(LOCATION, location);
            }
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// The seamless login gate and its collaborators.
#[derive(Clone)]
pub struct SeamlessLoginGate {
    modules: Arc<dyn ModuleAvailability>,
    config: Arc<dyn ConfigProvider>,
    claims: Arc<dyn ClaimsProvider>,
    clients: Arc<dyn OAuthClientFactory>,
    federation: Arc<dyn FederationCheck>,
}

impl SeamlessLoginGate {
    pub fn new(
        modules: Arc<dyn ModuleAvailability>,
        config: Arc<dyn ConfigProvider>,
        claims: Arc<dyn ClaimsProvider>,
        clients: Arc<dyn OAuthClientFactory>,
        federation: Arc<dyn FederationCheck>,
    ) -> Self {
        Self {
            modules,
            config,
            claims,
            clients,
            federation,
        }
    }

    /// Whether the CILogon client capability is currently installed.
    pub fn cilogon_available(&self) -> bool {
        self.modules.module_exists(CILOGON_AUTH_MODULE)
    }

    /// Decide whether `request` should be redirected to CILogon.
    ///
    /// `Ok(None)` means the request continues to normal routing.
    pub fn handle(
        &self,
        request: &RequestContext,
        settings: &GateSettings,
        session: &mut Session,
    ) -> Result<Option<AuthorizationRedirect>, GateError> {
        let verbose = settings.cookie_debug;

        if verbose {
            debug!(
                target: LOG_TARGET,
                enabled = settings.login_enabled,
                "redirect to cilogon is {}",
                if settings.login_enabled { "ENABLED" } else { "DISABLED" }
            );
        }

        if !settings.login_enabled {
            return Ok(None);
        }

        let cookie = request.cookies.get(&settings.cookie_name);
        let cookie_exists = cookie.is_some();

        if verbose {
            debug!(
                target: LOG_TARGET,
                cookie_name = %settings.cookie_name,
                cookie_value = cookie.unwrap_or("<not set>"),
                "seamless cookie lookup"
            );
        }

        if request.is_authenticated() {
            let route = request.route();

            if verbose {
                debug!(
                    target: LOG_TARGET,
                    route = route.unwrap_or("<none>"),
                    "user already authenticated"
                );
            }

            let logged_out_elsewhere = !cookie_exists
                && !routes::is_login_flow_route(route)
                && self.federation.is_federated(request.host());

            // Forced logout on cookie loss stays disabled.
            if logged_out_elsewhere && verbose {
                debug!(
                    target: LOG_TARGET,
                    route = route.unwrap_or("<none>"),
                    "seamless cookie gone for authenticated user, not forcing logout"
                );
            }

            return Ok(None);
        }

        if !self.cilogon_available() {
            return Ok(None);
        }

        if !cookie_exists {
            return Ok(None);
        }

        if verbose {
            debug!(target: LOG_TARGET, "redirect to cilogon");
        }

        let config_name = client_config_name(CILOGON_CLIENT);
        let configuration = self
            .config
            .get_config(&config_name)
            .ok_or(GateError::MissingConfig(config_name))?;
        let client = self.clients.create_client(CILOGON_CLIENT, &configuration)?;
        let scopes = self.claims.scopes();

        session.insert(OP_SESSION_KEY, "login");
        let redirect = client.authorize(&scopes, session)?;

        Ok(Some(redirect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use serde_json::json;

    struct Modules(HashSet<String>);

    impl ModuleAvailability for Modules {
        fn module_exists(&self, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    struct Config(Option<Value>);

    impl ConfigProvider for Config {
        fn get_config(&self, name: &str) -> Option<Value> {
            assert_eq!(name, "cilogon_auth.settings.cilogon");
            self.0.clone()
        }
    }

    struct Claims(Vec<String>);

    impl ClaimsProvider for Claims {
        fn scopes(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    /// Records every authorize call's scopes.
    #[derive(Default)]
    struct RecordingFactory {
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    struct RecordingClient {
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl OAuthClient for RecordingClient {
        fn authorize(
            &self,
            scopes: &[String],
            _session: &mut Session,
        ) -> Result<AuthorizationRedirect, GateError> {
            self.calls.lock().unwrap().push(scopes.to_vec());
            Ok(AuthorizationRedirect {
                location: Url::parse("https://cilogon.org/authorize?client_id=test")?,
            })
        }
    }

    impl OAuthClientFactory for RecordingFactory {
        fn create_client(
            &self,
            client_id: &str,
            _settings: &Value,
        ) -> Result<Box<dyn OAuthClient>, GateError> {
            assert_eq!(client_id, CILOGON_CLIENT);
            Ok(Box::new(RecordingClient {
                calls: self.calls.clone(),
            }))
        }
    }

    /// Counts federation checks to prove the inert branch is evaluated.
    #[derive(Default)]
    struct CountingFederation {
        calls: Mutex<usize>,
    }

    impl FederationCheck for CountingFederation {
        fn is_federated(&self, _host: Option<&str>) -> bool {
            *self.calls.lock().unwrap() += 1;
            true
        }
    }

    struct Fixture {
        gate: SeamlessLoginGate,
        calls: Arc<Mutex<Vec<Vec<String>>>>,
        federation: Arc<CountingFederation>,
    }

    fn fixture(installed: bool, config: Option<Value>) -> Fixture {
        let factory = RecordingFactory::default();
        let calls = factory.calls.clone();
        let federation = Arc::new(CountingFederation::default());
        let modules = if installed {
            HashSet::from([CILOGON_AUTH_MODULE.to_string()])
        } else {
            HashSet::new()
        };
        let gate = SeamlessLoginGate::new(
            Arc::new(Modules(modules)),
            Arc::new(Config(config)),
            Arc::new(Claims(vec!["openid".into(), "email".into(), "profile".into()])),
            Arc::new(factory),
            federation.clone(),
        );
        Fixture {
            gate,
            calls,
            federation,
        }
    }

    fn installed() -> Fixture {
        fixture(true, Some(json!({ "client_id": "test" })))
    }

    fn request(auth: AuthState, with_cookie: bool, route: Option<&str>) -> RequestContext {
        let cookies: RawCookies = if with_cookie {
            [("access_ci_sso", "1")].into_iter().collect()
        } else {
            RawCookies::default()
        };
        RequestContext {
            cookies,
            auth,
            route: route.map(str::to_string),
            host: Some("support.access-ci.org".to_string()),
        }
    }

    fn settings(enabled: bool, debug: bool) -> GateSettings {
        GateSettings {
            login_enabled: enabled,
            cookie_debug: debug,
            ..GateSettings::default()
        }
    }

    #[test]
    fn disabled_gate_never_responds() {
        let f = installed();
        for auth in [AuthState::Anonymous, AuthState::Authenticated] {
            for with_cookie in [true, false] {
                let mut session = Session::anonymous();
                let outcome = f
                    .gate
                    .handle(&request(auth, with_cookie, None), &settings(false, true), &mut session)
                    .unwrap();
                assert!(outcome.is_none());
                assert!(session.get(OP_SESSION_KEY).is_none());
            }
        }
        assert!(f.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn anonymous_without_cookie_is_left_alone() {
        let f = installed();
        let mut session = Session::anonymous();
        let outcome = f
            .gate
            .handle(
                &request(AuthState::Anonymous, false, None),
                &settings(true, true),
                &mut session,
            )
            .unwrap();
        assert!(outcome.is_none());
        assert!(session.get(OP_SESSION_KEY).is_none());
    }

    #[test]
    fn anonymous_with_cookie_but_no_client_is_left_alone() {
        let f = fixture(false, Some(json!({})));
        let mut session = Session::anonymous();
        let outcome = f
            .gate
            .handle(&request(AuthState::Anonymous, true, None), &settings(true, true), &mut session)
            .unwrap();
        assert!(outcome.is_none());
        assert!(f.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn anonymous_with_cookie_is_redirected_with_claims_scopes() {
        let f = installed();
        let mut session = Session::anonymous();
        let redirect = f
            .gate
            .handle(&request(AuthState::Anonymous, true, None), &settings(true, true), &mut session)
            .unwrap()
            .expect("redirect produced");

        assert_eq!(redirect.location.host_str(), Some("cilogon.org"));
        assert_eq!(session.get(OP_SESSION_KEY), Some("login"));
        assert_eq!(
            *f.calls.lock().unwrap(),
            vec![vec!["openid".to_string(), "email".to_string(), "profile".to_string()]]
        );
    }

    #[test]
    fn custom_cookie_name_is_honoured() {
        let f = installed();
        let custom = GateSettings {
            cookie_name: "other_sso".into(),
            ..GateSettings::default()
        };
        let mut session = Session::anonymous();
        let outcome = f
            .gate
            .handle(&request(AuthState::Anonymous, true, None), &custom, &mut session)
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn authenticated_user_is_never_redirected() {
        let f = installed();
        let cases = [
            (true, Some("some.other.route")),
            (false, Some("some.other.route")),
            (false, None),
            (false, Some(routes::USER_LOGOUT_ROUTE)),
        ];
        for (with_cookie, route) in cases {
            let mut session = Session::anonymous();
            session.user_id = Some("user_1".into());
            let outcome = f
                .gate
                .handle(
                    &request(AuthState::Authenticated, with_cookie, route),
                    &settings(true, true),
                    &mut session,
                )
                .unwrap();
            assert!(outcome.is_none());
            assert!(session.get(OP_SESSION_KEY).is_none());
        }
        assert!(f.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn logout_branch_is_evaluated_but_inert() {
        let f = installed();
        let mut session = Session::anonymous();
        let outcome = f
            .gate
            .handle(
                &request(AuthState::Authenticated, false, Some("some.other.route")),
                &settings(true, true),
                &mut session,
            )
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(*f.federation.calls.lock().unwrap(), 1);

        // Login-flow routes short-circuit before the federation check.
        f.gate
            .handle(
                &request(AuthState::Authenticated, false, Some(routes::USER_LOGIN_ROUTE)),
                &settings(true, true),
                &mut session,
            )
            .unwrap();
        assert_eq!(*f.federation.calls.lock().unwrap(), 1);
    }

    #[test]
    fn debug_flag_does_not_change_outcome() {
        let f = installed();
        for (auth, with_cookie) in [
            (AuthState::Anonymous, true),
            (AuthState::Anonymous, false),
            (AuthState::Authenticated, false),
        ] {
            let mut loud = Session::anonymous();
            let mut quiet = Session::anonymous();
            let a = f
                .gate
                .handle(&request(auth, with_cookie, None), &settings(true, true), &mut loud)
                .unwrap();
            let b = f
                .gate
                .handle(&request(auth, with_cookie, None), &settings(true, false), &mut quiet)
                .unwrap();
            assert_eq!(a, b);
            assert_eq!(loud.get(OP_SESSION_KEY), quiet.get(OP_SESSION_KEY));
        }
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run the anonymous redirect and the inert logout branch, returning the log output.
    fn logs_for(debug: bool) -> String {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        let f = installed();
        tracing::subscriber::with_default(subscriber, || {
            let mut session = Session::anonymous();
            let redirect = f
                .gate
                .handle(
                    &request(AuthState::Anonymous, true, None),
                    &settings(true, debug),
                    &mut session,
                )
                .unwrap();
            assert!(redirect.is_some());

            let outcome = f
                .gate
                .handle(
                    &request(AuthState::Authenticated, false, Some("some.other.route")),
                    &settings(true, debug),
                    &mut session,
                )
                .unwrap();
            assert!(outcome.is_none());
        });

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn debug_lines_are_logged_only_when_cookie_debug_is_on() {
        let loud = logs_for(true);
        for line in [
            "redirect to cilogon is ENABLED",
            "seamless cookie lookup",
            "redirect to cilogon",
            "user already authenticated",
            "not forcing logout",
        ] {
            assert!(loud.contains(line), "missing {line:?} in:\n{loud}");
        }
        assert!(loud.contains(LOG_TARGET));

        let quiet = logs_for(false);
        assert!(!quiet.contains(LOG_TARGET), "unexpected output:\n{quiet}");
        assert!(!quiet.contains("not forcing logout"));
    }

    #[test]
    fn missing_client_config_fails_loudly() {
        let f = fixture(true, None);
        let mut session = Session::anonymous();
        let err = f
            .gate
            .handle(
                &request(AuthState::Anonymous, true, None),
                &settings(true, false),
                &mut session,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::MissingConfig(name) if name == "cilogon_auth.settings.cilogon"
        ));
    }

    #[test]
    fn redirect_response_is_302_with_location() {
        let redirect = AuthorizationRedirect {
            location: Url::parse("https://cilogon.org/authorize?state=x").unwrap(),
        };
        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://cilogon.org/authorize?state=x"
        );
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
    }
}
