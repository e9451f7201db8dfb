// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CILogon OAuth client: builds the authorization-code request URL.

use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::gate::{
    AuthorizationRedirect, GateError, OAuthClient, OAuthClientFactory, CILOGON_CLIENT,
};
use crate::session::{Session, STATE_TOKEN_SESSION_KEY};

pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://cilogon.org/authorize";

fn default_authorization_endpoint() -> String {
    DEFAULT_AUTHORIZATION_ENDPOINT.to_string()
}

/// Settings blob stored under `cilogon_auth.settings.cilogon`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CilogonClientSettings {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,
    /// Preselects the identity provider on the CILogon consent page.
    #[serde(default)]
    pub idp_hint: Option<String>,
}

/// OAuth client for CILogon.
#[derive(Debug, Clone)]
pub struct CilogonClient {
    settings: CilogonClientSettings,
}

impl CilogonClient {
    pub fn new(settings: CilogonClientSettings) -> Self {
        Self { settings }
    }

    /// Authorization URL for `scopes` with a fresh CSRF `state`.
    pub fn authorization_url(&self, scopes: &[String]) -> Result<(Url, CsrfToken), GateError> {
        let client = BasicClient::new(ClientId::new(self.settings.client_id.clone()))
            .set_auth_uri(AuthUrl::new(self.settings.authorization_endpoint.clone())?)
            .set_redirect_uri(RedirectUrl::new(self.settings.redirect_uri.clone())?);

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().cloned().map(Scope::new));
        if let Some(idp) = &self.settings.idp_hint {
            request = request.add_extra_param("idphint", idp.clone());
        }
        Ok(request.url())
    }
}

impl OAuthClient for CilogonClient {
    fn authorize(
        &self,
        scopes: &[String],
        session: &mut Session,
    ) -> Result<AuthorizationRedirect, GateError> {
        let (location, csrf) = self.authorization_url(scopes)?;
        session.insert(STATE_TOKEN_SESSION_KEY, csrf.secret().clone());
        Ok(AuthorizationRedirect { location })
    }
}

/// Creates [`CilogonClient`]s; `cilogon` is the only client id it knows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CilogonClientFactory;

impl OAuthClientFactory for CilogonClientFactory {
    fn create_client(
        &self,
        client_id: &str,
        settings: &Value,
    ) -> Result<Box<dyn OAuthClient>, GateError> {
        if client_id != CILOGON_CLIENT {
            return Err(GateError::UnknownClient(client_id.to_string()));
        }
        let settings = CilogonClientSettings::deserialize(settings)?;
        Ok(Box::new(CilogonClient::new(settings)))
    }
}
