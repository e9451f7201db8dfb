// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # CILogon Integration
//!
//! Concrete collaborators for the seamless login gate:
//!
//! - `ModuleRegistry` - which optional capabilities are installed
//! - `ConfigFactory` - named configuration blobs
//! - `CilogonClaims` - scopes to request
//! - `CilogonClientFactory` - builds the authorization redirect

pub mod claims;
pub mod client;

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use crate::config::CilogonEnv;
use crate::gate::{
    client_config_name, ConfigProvider, ModuleAvailability, CILOGON_AUTH_MODULE, CILOGON_CLIENT,
};

pub use claims::CilogonClaims;
pub use client::{CilogonClient, CilogonClientFactory, CilogonClientSettings};

/// Set of installed capabilities.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    installed: HashSet<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(mut self, name: impl Into<String>) -> Self {
        self.installed.insert(name.into());
        self
    }
}

impl ModuleAvailability for ModuleRegistry {
    fn module_exists(&self, name: &str) -> bool {
        self.installed.contains(name)
    }
}

/// Named configuration blobs.
#[derive(Debug, Clone, Default)]
pub struct ConfigFactory {
    configs: HashMap<String, Value>,
}

impl ConfigFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.configs.insert(name.into(), value);
        self
    }
}

impl ConfigProvider for ConfigFactory {
    fn get_config(&self, name: &str) -> Option<Value> {
        self.configs.get(name).cloned()
    }
}

/// Registry and configuration for the given environment.
///
/// The CILogon client counts as installed whenever a client id is configured.
pub fn collaborators(env: Option<&CilogonEnv>) -> (ModuleRegistry, ConfigFactory, CilogonClaims) {
    let Some(env) = env else {
        return (ModuleRegistry::new(), ConfigFactory::new(), CilogonClaims::default());
    };

    let mut settings = json!({ "client_id": env.client_id });
    if let Some(redirect_uri) = &env.redirect_uri {
        settings["redirect_uri"] = json!(redirect_uri);
    }
    if let Some(endpoint) = &env.authorization_endpoint {
        settings["authorization_endpoint"] = json!(endpoint);
    }
    if let Some(idp) = &env.idp_hint {
        settings["idp_hint"] = json!(idp);
    }

    (
        ModuleRegistry::new().install(CILOGON_AUTH_MODULE),
        ConfigFactory::new().with(client_config_name(CILOGON_CLIENT), settings),
        CilogonClaims::new(env.claims.iter().cloned()),
    )
}
