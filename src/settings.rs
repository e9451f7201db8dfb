// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide seamless login settings.
//!
//! Settings live in a key/value store managed by site administrators. The gate
//! never writes them; it resolves a fresh [`GateSettings`] on every request.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::SeamlessSeed;

pub const LOGIN_ENABLED_KEY: &str = "drupal_seamless_cilogon.seamless_login_enabled";
pub const COOKIE_DEBUG_KEY: &str = "drupal_seamless_cilogon.seamless_cookie_debug";
pub const COOKIE_NAME_KEY: &str = "drupal_seamless_cilogon.seamless_cookie_name";
/// Older sites stored the cookie name under this key.
pub const LEGACY_COOKIE_NAME_KEY: &str = "drupal_seamless_cilogon.seamlesscookiename";

pub const DEFAULT_COOKIE_NAME: &str = "access_ci_sso";

/// Key/value settings storage with get-by-name semantics.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from startup configuration.
    pub fn seeded(seed: &SeamlessSeed) -> Self {
        let store = Self::new();
        if let Some(enabled) = seed.login_enabled {
            store.set(LOGIN_ENABLED_KEY, Value::Bool(enabled));
        }
        if let Some(debug) = seed.cookie_debug {
            store.set(COOKIE_DEBUG_KEY, Value::Bool(debug));
        }
        if let Some(name) = &seed.cookie_name {
            store.set(COOKIE_NAME_KEY, Value::String(name.clone()));
        }
        store
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

/// Settings snapshot used for a single gate decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GateSettings {
    /// Redirect anonymous visitors carrying the shared cookie.
    pub login_enabled: bool,
    /// Emit a debug log line at each decision point.
    pub cookie_debug: bool,
    /// Name of the shared cross-subdomain cookie.
    pub cookie_name: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            login_enabled: true,
            cookie_debug: true,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

impl GateSettings {
    /// Read the current values, applying defaults for anything unset or of
    /// the wrong type.
    pub fn resolve(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            login_enabled: store.get_bool(LOGIN_ENABLED_KEY, defaults.login_enabled),
            cookie_debug: store.get_bool(COOKIE_DEBUG_KEY, defaults.cookie_debug),
            cookie_name: store
                .get_string(COOKIE_NAME_KEY)
                .or_else(|| store.get_string(LEGACY_COOKIE_NAME_KEY))
                .unwrap_or(defaults.cookie_name),
        }
    }
}
