// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scopes derived from the claims the site wants back from CILogon.

use crate::gate::ClaimsProvider;

const BASE_SCOPES: [&str; 2] = ["openid", "email"];

const PROFILE_CLAIMS: [&str; 4] = ["name", "given_name", "family_name", "preferred_username"];

const USERINFO_CLAIMS: [&str; 6] = ["idp", "idp_name", "affiliation", "eppn", "eptid", "ou"];

/// Claims configuration for the CILogon client.
#[derive(Debug, Clone, Default)]
pub struct CilogonClaims {
    claims: Vec<String>,
}

impl CilogonClaims {
    pub fn new<I, S>(claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }

    fn wants_any(&self, group: &[&str]) -> bool {
        self.claims.iter().any(|c| group.contains(&c.as_str()))
    }
}

impl ClaimsProvider for CilogonClaims {
    fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = BASE_SCOPES.iter().map(|s| s.to_string()).collect();
        if self.wants_any(&PROFILE_CLAIMS) {
            scopes.push("profile".to_string());
        }
        if self.wants_any(&USERINFO_CLAIMS) {
            scopes.push("org.cilogon.userinfo".to_string());
        }
        scopes
    }
}
