// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::cilogon::{self, CilogonClientFactory};
use crate::config::{ServerConfig, DEFAULT_FEDERATION_DOMAIN, DEFAULT_SESSION_COOKIE_NAME};
use crate::gate::{FederationDomains, RouteTable, SeamlessLoginGate};
use crate::session::SessionStore;
use crate::settings::{InMemorySettings, SettingsStore};

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
}

impl SessionCookieConfig {
    /// Cookie binding the browser to `session_id`.
    pub fn cookie(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((self.name.clone(), session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    /// `Set-Cookie` header value for [`Self::cookie`].
    pub fn header_value(&self, session_id: &str) -> String {
        self.cookie(session_id).to_string()
    }
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            secure: true,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsStore>,
    pub sessions: Arc<SessionStore>,
    pub gate: Arc<SeamlessLoginGate>,
    pub routes: Arc<RouteTable>,
    pub session_cookie: SessionCookieConfig,
    /// Bearer token guarding the admin API. `None` disables it.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(settings: Arc<dyn SettingsStore>, gate: SeamlessLoginGate) -> Self {
        Self {
            settings,
            sessions: Arc::new(SessionStore::new()),
            gate: Arc::new(gate),
            routes: Arc::new(RouteTable::default()),
            session_cookie: SessionCookieConfig::default(),
            admin_token: None,
        }
    }

    /// Wire the production collaborators from server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let (modules, configs, claims) = cilogon::collaborators(config.cilogon.as_ref());
        let gate = SeamlessLoginGate::new(
            Arc::new(modules),
            Arc::new(configs),
            Arc::new(claims),
            Arc::new(CilogonClientFactory),
            Arc::new(FederationDomains::new(&config.federation_domains)),
        );
        let settings = Arc::new(InMemorySettings::seeded(&config.seed));

        let mut state = Self::new(settings, gate).with_session_cookie(SessionCookieConfig {
            name: config.session_cookie_name.clone(),
            secure: config.session_cookie_secure,
        });
        state.sessions = Arc::new(SessionStore::with_capacity(config.session_max_entries));
        if let Some(token) = &config.admin_token {
            state = state.with_admin_token(token.as_str());
        }
        state
    }

    pub fn with_session_cookie(mut self, session_cookie: SessionCookieConfig) -> Self {
        self.session_cookie = session_cookie;
        self
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(Arc::from(token));
        self
    }

}

impl Default for AppState {
    /// No CILogon client installed, default settings.
    fn default() -> Self {
        let (modules, configs, claims) = cilogon::collaborators(None);
        let gate = SeamlessLoginGate::new(
            Arc::new(modules),
            Arc::new(configs),
            Arc::new(claims),
            Arc::new(CilogonClientFactory),
            Arc::new(FederationDomains::new([DEFAULT_FEDERATION_DOMAIN])),
        );
        Self::new(Arc::new(InMemorySettings::new()), gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SESSION_MAX_ENTRIES;

    #[test]
    fn session_cookie_header_respects_secure_flag() {
        let cookie = SessionCookieConfig {
            name: "sid".into(),
            secure: false,
        };
        let parsed = Cookie::parse(cookie.header_value("abc")).unwrap();
        assert_eq!(parsed.name(), "sid");
        assert_eq!(parsed.value(), "abc");
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_ne!(parsed.secure(), Some(true));

        let secure = SessionCookieConfig::default();
        let parsed = Cookie::parse(secure.header_value("abc")).unwrap();
        assert_eq!(parsed.name(), "seamless_session");
        assert_eq!(parsed.secure(), Some(true));
        assert_eq!(parsed.http_only(), Some(true));
    }

    #[tokio::test]
    async fn from_config_installs_cilogon_when_configured() {
        let config = ServerConfig::from_lookup(|key| match key {
            "CILOGON_CLIENT_ID" => Some("cid".to_string()),
            "ADMIN_TOKEN" => Some("secret".to_string()),
            _ => None,
        });
        let state = AppState::from_config(&config);
        assert!(state.gate.cilogon_available());
        assert_eq!(state.admin_token.as_deref(), Some("secret"));
        assert_eq!(state.sessions.capacity().await, DEFAULT_SESSION_MAX_ENTRIES);

        assert!(!AppState::default().gate.cilogon_available());
    }
}
