// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Seamless CILogon - cross-subdomain seamless login gate
//!
//! Sites in a federation share an SSO cookie across subdomains. When an
//! anonymous visitor arrives carrying that cookie, they already signed in on a
//! sibling site, so this service sends them straight into the CILogon
//! authorization flow instead of showing them an anonymous page.
//!
//! ## Modules
//!
//! - `gate` - the per-request decision and its axum middleware
//! - `cilogon` - CILogon client, claims, and installed-capability registry
//! - `settings` - process-wide seamless login settings
//! - `session` - server-side sessions and the idle-session sweeper
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - admin API authentication

pub mod api;
pub mod auth;
pub mod cilogon;
pub mod config;
pub mod error;
pub mod gate;
pub mod session;
pub mod settings;
pub mod state;
