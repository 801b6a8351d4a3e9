// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Periodic background work: feed refresh and limiter cleanup.

use crate::handlers::AppState;
use crate::limiter::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handles of the running background tasks. Dropping it aborts them.
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Spawn the feed refresher and one cleanup sweep per limiter.
    pub fn spawn(state: &Arc<AppState>) -> Self {
        let refresh_state = state.clone();
        let refresh_every = state.config.feed.refresh_interval();
        let refresher = tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh_every);
            // The initial load happens at startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                // Failures are recorded in the feed state.
                if let Err(e) = refresh_state.feed.refresh().await {
                    debug!(error = %e, "Scheduled feed refresh failed");
                }
            }
        });

        let sweep_every = state.config.limits.cleanup_interval();
        let handles = vec![
            refresher,
            spawn_cleanup(state.share.limiter().clone(), sweep_every),
            spawn_cleanup(state.likes.limiter().clone(), sweep_every),
        ];

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.abort();
    }
}

fn spawn_cleanup(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; nothing to sweep yet.
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    })
}
