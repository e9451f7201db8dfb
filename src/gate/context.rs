// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request view handed to the gate.

use std::collections::HashMap;

use axum::http::{
    header::{COOKIE, HOST},
    HeaderMap,
};

/// Authentication state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Anonymous,
}

/// Cookies exactly as they arrived on the wire.
///
/// Parsed straight from the `Cookie` header(s) instead of going through a
/// cookie jar: jar implementations drop or rewrite values set by sibling
/// subdomains, which is precisely the cookie the gate needs to see. When a
/// name repeats, the first occurrence wins. A bare name without `=` is
/// present with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCookies(HashMap<String, String>);

impl RawCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.trim().trim_matches('"').to_string());
            }
        }
        Self(cookies)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawCookies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cookies = HashMap::new();
        for (k, v) in iter {
            cookies.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(cookies)
    }
}

/// Everything the gate is allowed to know about the inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub cookies: RawCookies,
    pub auth: AuthState,
    /// Route identifier, when the path maps to a known route.
    pub route: Option<String>,
    /// Lowercased host without port.
    pub host: Option<String>,
}

impl RequestContext {
    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

/// Extract the request host from the `Host` header, dropping any port.
pub fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(HOST)?.to_str().ok()?.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        // IPv6 literal
        rest.split(']').next().unwrap_or(rest)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
