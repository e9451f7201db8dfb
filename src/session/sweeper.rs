// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Background task that periodically drops idle sessions so anonymous
//! visitors who triggered a seamless redirect but never came back do not
//! accumulate in memory.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::SessionStore;
use crate::config::DEFAULT_PENDING_LOGIN_TTL;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background sweeper that expires idle sessions.
pub struct SessionSweeper {
    sessions: Arc<SessionStore>,
    ttl: Duration,
    pending_ttl: Duration,
    sweep_interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionStore>, ttl: Duration) -> Self {
        Self {
            sessions,
            ttl,
            pending_ttl: DEFAULT_PENDING_LOGIN_TTL.min(ttl),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Idle timeout for anonymous sessions holding a pending login.
    pub fn with_pending_ttl(mut self, pending_ttl: Duration) -> Self {
        self.pending_ttl = pending_ttl;
        self
    }

    pub fn with_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            pending_ttl_secs = self.pending_ttl.as_secs(),
            "Session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session sweeper shutting down");
                return;
            }

            self.sweep_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }
        }
    }

    async fn sweep_step(&self) -> usize {
        let removed = self
            .sessions
            .purge_idle(self.ttl, self.pending_ttl, Utc::now())
            .await;
        if removed > 0 {
            debug!(removed, "Session sweeper: expired idle sessions");
        }
        removed
    }
}
