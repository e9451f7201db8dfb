// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route identifiers the gate cares about.

pub const USER_LOGIN_ROUTE: &str = "user.login";
pub const USER_LOGOUT_ROUTE: &str = "user.logout";
pub const CILOGON_REDIRECT_ROUTE: &str = "cilogon_auth.redirect_controller_redirect";

/// Maps request paths to route identifiers.
#[derive(Debug, Clone)]
pub struct RouteTable {
    login_path: String,
    logout_path: String,
    cilogon_redirect_prefix: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login_path: "/user/login".to_string(),
            logout_path: "/user/logout".to_string(),
            cilogon_redirect_prefix: "/cilogon-auth/".to_string(),
        }
    }
}

impl RouteTable {
    /// Resolve `path` to a route identifier, ignoring a trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&'static str> {
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if trimmed == self.login_path {
            Some(USER_LOGIN_ROUTE)
        } else if trimmed == self.logout_path {
            Some(USER_LOGOUT_ROUTE)
        } else if trimmed
            .strip_prefix(self.cilogon_redirect_prefix.as_str())
            .is_some_and(|client| !client.is_empty() && !client.contains('/'))
        {
            Some(CILOGON_REDIRECT_ROUTE)
        } else {
            None
        }
    }
}

/// Routes that belong to the login/logout flow itself.
pub fn is_login_flow_route(route: Option<&str>) -> bool {
    matches!(
        route,
        Some(USER_LOGOUT_ROUTE) | Some(USER_LOGIN_ROUTE) | Some(CILOGON_REDIRECT_ROUTE)
    )
}
