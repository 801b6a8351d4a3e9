// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client side of the hosted backend.
//!
//! The backend owns every piece of persistent state: the `emotions` table,
//! the `emotion_likes` table and the `toggle_emotion_like` procedure. This
//! module only describes the calls made against it.

mod memory;
mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

use crate::error::Result;
use crate::models::{EmotionRow, LikeRecord, NewEmotionPost};
use async_trait::async_trait;
use std::collections::HashSet;

/// Operations the service needs from the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Insert one row into `emotions`.
    async fn insert_emotion(&self, post: &NewEmotionPost) -> Result<()>;

    /// Most recent `emotions` rows, newest first.
    async fn recent_emotions(&self, limit: usize) -> Result<Vec<EmotionRow>>;

    /// Which of `ids` carry a like from `user_ip`.
    async fn liked_emotion_ids(&self, ids: &[i64], user_ip: &str) -> Result<HashSet<i64>>;

    /// Atomic server-side like toggle (`toggle_emotion_like`).
    async fn toggle_like(&self, like: &LikeRecord) -> Result<()>;

    /// Overwrite the like counter of one post.
    async fn set_likes(&self, emotion_id: i64, likes: i64) -> Result<()>;

    async fn insert_like(&self, like: &LikeRecord) -> Result<()>;

    async fn delete_like(&self, like: &LikeRecord) -> Result<()>;
}
