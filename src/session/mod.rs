// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sessions
//!
//! Server-side sessions keyed by an opaque id carried in the session cookie.
//! A session is authenticated once a login handler attaches a user to it; the
//! seamless gate only reads that state and writes string values such as the
//! `cilogon_auth_op` marker.
//!
//! The CILogon callback handler that finishes the login belongs to the host
//! application mounting this gate; it calls [`SessionStore::authenticate`].
//!
//! The table is an LRU capped at a fixed number of entries. Anonymous
//! sessions only exist to carry a pending login, so the sweeper expires them
//! on a much shorter idle timeout than authenticated ones.

pub mod sweeper;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::DEFAULT_SESSION_MAX_ENTRIES;

pub use sweeper::SessionSweeper;

/// Session key recording which CILogon operation is in flight.
pub const OP_SESSION_KEY: &str = "cilogon_auth_op";
/// Session key holding the `state` parameter sent to CILogon.
pub const STATE_TOKEN_SESSION_KEY: &str = "cilogon_auth_state_token";

/// A single visitor session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    /// Authenticated user, `None` for anonymous visitors.
    pub user_id: Option<String>,
    values: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    /// Start a fresh anonymous session with a random id.
    pub fn anonymous() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            values: HashMap::new(),
            created_at: now,
            last_seen: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_seen).to_std().unwrap_or(Duration::ZERO)
    }
}

/// In-memory session table, least recently used sessions evicted first.
pub struct SessionStore {
    sessions: Mutex<LruCache<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_MAX_ENTRIES)
    }

    /// Store holding at most `capacity` sessions (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Fetch a session by id and mark it as seen.
    pub async fn load(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(id)?;
        session.last_seen = Utc::now();
        Some(session.clone())
    }

    /// Insert or replace a session, evicting the least recently used one when full.
    pub async fn save(&self, session: Session) {
        let id = session.id.clone();
        let mut sessions = self.sessions.lock().await;
        // `push` also returns the replaced entry when the id is already stored.
        if let Some((evicted, _)) = sessions.push(id.clone(), session) {
            if evicted != id {
                tracing::debug!(capacity = sessions.cap().get(), "Session table full, evicted LRU");
            }
        }
    }

    /// Attach an authenticated user to an existing session.
    ///
    /// Returns `false` if the session does not exist.
    pub async fn authenticate(&self, id: &str, user_id: impl Into<String>) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.user_id = Some(user_id.into());
                session.remove(OP_SESSION_KEY);
                session.remove(STATE_TOKEN_SESSION_KEY);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.pop(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.sessions.lock().await.cap().get()
    }

    /// Drop authenticated sessions idle for longer than `ttl` and anonymous
    /// ones idle for longer than `pending_ttl`. Returns how many were removed.
    pub async fn purge_idle(
        &self,
        ttl: Duration,
        pending_ttl: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let mut sessions = self.sessions.lock().await;
        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| {
                let limit = if session.is_authenticated() {
                    ttl
                } else {
                    pending_ttl
                };
                session.idle_for(now) > limit
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            sessions.pop(id);
        }
        stale.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
