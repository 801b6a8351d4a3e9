// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Like toggling.
//!
//! Each (post, viewer) pair flips between liked and not liked. A toggle is
//! admitted only when no toggle for the same pair is in flight and the like
//! limiter admits the viewer. Admitted toggles update the cached feed first,
//! then go to the backend: the `toggle_emotion_like` procedure, or when that
//! fails, a counter update followed by inserting or deleting the like row.
//!
//! The cached update is never rolled back. If the backend writes fail, the
//! cache is wrong until the next feed refresh.
//!
//! Viewers without a usable address have no identity to hold a like, so
//! their toggles change nothing.

use crate::backend::Backend;
use crate::feed::{FeedService, LikeFlip};
use crate::limiter::RateLimiter;
use crate::models::{LikeRecord, ViewerIp};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Limiter identifier for requests that carry no viewer identity.
pub const ANONYMOUS: &str = "anonymous";

/// What happened to a like request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LikeOutcome {
    /// The like was flipped
    Applied { liked: bool, likes: i64 },
    /// A toggle for the same post and viewer is still running
    InFlight,
    /// The like limiter rejected the viewer
    RateLimited,
    /// Not a valid post id
    Ignored,
    /// The viewer could not be identified
    Unidentified,
}

impl LikeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::InFlight => "in_flight",
            Self::RateLimited => "rate_limited",
            Self::Ignored => "ignored",
            Self::Unidentified => "unidentified",
        }
    }
}

type PairKey = (i64, String);

pub struct LikeService {
    backend: Arc<dyn Backend>,
    feed: Arc<FeedService>,
    limiter: Arc<RateLimiter>,
    in_flight: Arc<Mutex<HashSet<PairKey>>>,
}

/// Releases the in-flight marker when the toggle finishes, however it ends.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<PairKey>>>,
    key: PairKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
    }
}

fn lock(set: &Mutex<HashSet<PairKey>>) -> MutexGuard<'_, HashSet<PairKey>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl LikeService {
    pub fn new(
        backend: Arc<dyn Backend>,
        feed: Arc<FeedService>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            backend,
            feed,
            limiter,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Whether a toggle for this pair is currently running.
    pub fn is_in_flight(&self, emotion_id: i64, viewer: &ViewerIp) -> bool {
        lock(&self.in_flight).contains(&(emotion_id, viewer.as_str().to_string()))
    }

    /// Toggle the viewer's like on a post.
    pub async fn toggle(&self, emotion_id: i64, viewer: &ViewerIp) -> LikeOutcome {
        if emotion_id <= 0 {
            return LikeOutcome::Ignored;
        }
        if !viewer.is_known() {
            debug!(emotion_id, "Like from unidentified viewer dropped");
            return LikeOutcome::Unidentified;
        }

        let key = (emotion_id, viewer.as_str().to_string());
        if lock(&self.in_flight).contains(&key) {
            debug!(emotion_id, viewer = %viewer, "Like already in flight");
            return LikeOutcome::InFlight;
        }

        if !self.limiter.is_allowed(viewer.as_str()).await {
            debug!(emotion_id, viewer = %viewer, "Like dropped by rate limiter");
            return LikeOutcome::RateLimited;
        }

        // Claim the pair; a concurrent toggle may have claimed it while the
        // limiter was consulted.
        if !lock(&self.in_flight).insert(key.clone()) {
            return LikeOutcome::InFlight;
        }
        let _guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            key,
        };

        let flip = self.feed.flip_like(emotion_id, viewer).await;

        let like = LikeRecord {
            emotion_id,
            user_ip: viewer.as_str().to_string(),
        };
        if let Err(e) = self.backend.toggle_like(&like).await {
            debug!(error = %e, emotion_id, "Like procedure failed, using table writes");
            self.fallback(&like, flip).await;
        }

        LikeOutcome::Applied {
            liked: !flip.was_liked,
            likes: flip.likes,
        }
    }

    /// Reproduce the procedure's effect with two separate writes. Not atomic,
    /// and failures are only logged. The like row is written even when the
    /// counter update fails.
    async fn fallback(&self, like: &LikeRecord, flip: LikeFlip) {
        if let Err(e) = self.backend.set_likes(like.emotion_id, flip.likes).await {
            warn!(error = %e, emotion_id = like.emotion_id, "Like counter update failed");
        }

        let result = if flip.was_liked {
            self.backend.delete_like(like).await
        } else {
            self.backend.insert_like(like).await
        };
        if let Err(e) = result {
            warn!(error = %e, emotion_id = like.emotion_id, "Like record write failed");
        }
    }
}
