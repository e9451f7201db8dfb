// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Plain HTTP when unset |
//! | `SESSION_COOKIE_NAME` | Cookie carrying the local session id | `seamless_session` |
//! | `SESSION_COOKIE_SECURE` | Add `Secure` to the session cookie | `true` |
//! | `SESSION_TTL_SECS` | Idle lifetime of an authenticated session | `86400` |
//! | `SESSION_PENDING_TTL_SECS` | Idle lifetime of an anonymous pending-login session | `900` |
//! | `SESSION_MAX_ENTRIES` | Sessions kept in memory before LRU eviction | `100000` |
//! | `ADMIN_TOKEN` | Bearer token for `/v1/admin/*` | Admin API disabled |
//! | `CILOGON_CLIENT_ID` | CILogon OAuth client id | CILogon client not installed |
//! | `CILOGON_REDIRECT_URI` | Callback URL registered with CILogon | Required with client id |
//! | `CILOGON_AUTHORIZATION_ENDPOINT` | Authorization endpoint | `https://cilogon.org/authorize` |
//! | `CILOGON_IDP_HINT` | Identity provider hint (`idphint`) | None |
//! | `CILOGON_CLAIMS` | Comma separated claims to request | None |
//! | `FEDERATION_DOMAINS` | Comma separated federated domain suffixes | `access-ci.org` |
//! | `SEAMLESS_LOGIN_ENABLED` | Initial `seamless_login_enabled` setting | `true` |
//! | `SEAMLESS_COOKIE_DEBUG` | Initial `seamless_cookie_debug` setting | `true` |
//! | `SEAMLESS_COOKIE_NAME` | Initial `seamless_cookie_name` setting | `access_ci_sso` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug,seamless_cilogon=debug` |

use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const SESSION_COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
pub const SESSION_COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_PENDING_TTL_SECS_ENV: &str = "SESSION_PENDING_TTL_SECS";
pub const SESSION_MAX_ENTRIES_ENV: &str = "SESSION_MAX_ENTRIES";
pub const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";
pub const CILOGON_CLIENT_ID_ENV: &str = "CILOGON_CLIENT_ID";
pub const CILOGON_REDIRECT_URI_ENV: &str = "CILOGON_REDIRECT_URI";
pub const CILOGON_AUTHORIZATION_ENDPOINT_ENV: &str = "CILOGON_AUTHORIZATION_ENDPOINT";
pub const CILOGON_IDP_HINT_ENV: &str = "CILOGON_IDP_HINT";
pub const CILOGON_CLAIMS_ENV: &str = "CILOGON_CLAIMS";
pub const FEDERATION_DOMAINS_ENV: &str = "FEDERATION_DOMAINS";
pub const SEAMLESS_LOGIN_ENABLED_ENV: &str = "SEAMLESS_LOGIN_ENABLED";
pub const SEAMLESS_COOKIE_DEBUG_ENV: &str = "SEAMLESS_COOKIE_DEBUG";
pub const SEAMLESS_COOKIE_NAME_ENV: &str = "SEAMLESS_COOKIE_NAME";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "seamless_session";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_PENDING_LOGIN_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_SESSION_MAX_ENTRIES: usize = 100_000;
pub const DEFAULT_FEDERATION_DOMAIN: &str = "access-ci.org";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,seamless_cilogon=debug";

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// CILogon client settings taken from the environment.
///
/// Present only when `CILOGON_CLIENT_ID` is set; its absence is how the
/// service models "the CILogon client is not installed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CilogonEnv {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub idp_hint: Option<String>,
    pub claims: Vec<String>,
}

/// Initial values for the seamless settings store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeamlessSeed {
    pub login_enabled: Option<bool>,
    pub cookie_debug: Option<bool>,
    pub cookie_name: Option<String>,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub session_ttl: Duration,
    pub session_pending_ttl: Duration,
    pub session_max_entries: usize,
    pub admin_token: Option<String>,
    pub cilogon: Option<CilogonEnv>,
    pub federation_domains: Vec<String>,
    pub seed: SeamlessSeed,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let cilogon = get(CILOGON_CLIENT_ID_ENV).map(|client_id| CilogonEnv {
            client_id,
            redirect_uri: get(CILOGON_REDIRECT_URI_ENV),
            authorization_endpoint: get(CILOGON_AUTHORIZATION_ENDPOINT_ENV),
            idp_hint: get(CILOGON_IDP_HINT_ENV),
            claims: get(CILOGON_CLAIMS_ENV)
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        });

        let federation_domains = get(FEDERATION_DOMAINS_ENV)
            .map(|v| split_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_FEDERATION_DOMAIN.to_string()]);

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get(PORT_ENV)
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            tls_cert_path: get(TLS_CERT_PATH_ENV),
            tls_key_path: get(TLS_KEY_PATH_ENV),
            session_cookie_name: get(SESSION_COOKIE_NAME_ENV)
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string()),
            session_cookie_secure: get(SESSION_COOKIE_SECURE_ENV)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            session_ttl: get(SESSION_TTL_SECS_ENV)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SESSION_TTL),
            session_pending_ttl: get(SESSION_PENDING_TTL_SECS_ENV)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PENDING_LOGIN_TTL),
            session_max_entries: get(SESSION_MAX_ENTRIES_ENV)
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_SESSION_MAX_ENTRIES),
            admin_token: get(ADMIN_TOKEN_ENV),
            cilogon,
            federation_domains,
            seed: SeamlessSeed {
                login_enabled: get(SEAMLESS_LOGIN_ENABLED_ENV).and_then(|v| parse_bool(&v)),
                cookie_debug: get(SEAMLESS_COOKIE_DEBUG_ENV).and_then(|v| parse_bool(&v)),
                cookie_name: get(SEAMLESS_COOKIE_NAME_ENV),
            },
            log_format,
        }
    }

    /// TLS paths, when both halves are configured.
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the usual spellings of a boolean environment value.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
