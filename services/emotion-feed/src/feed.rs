// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Cached feed of recent emotions.
//!
//! The feed is re-read from the backend on a fixed interval. Between reads,
//! like toggles adjust the cached counters optimistically; the next read
//! replaces them with the backend's numbers.

use crate::backend::Backend;
use crate::error::{Result, LOAD_FAILED};
use crate::models::{EmotionPost, EmotionRow, FeedStats, ViewerIp};
use crate::validator::{escape_html, process_user_input, InputKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct FeedState {
    posts: Vec<EmotionPost>,
    stats: FeedStats,
    error: Option<String>,
}

/// A post as served to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: EmotionPost,
    /// Message escaped for HTML rendering
    pub message_html: Option<String>,
    pub liked: bool,
    pub age: String,
}

/// The feed as served to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub emotions: Vec<PostView>,
    pub stats: FeedStats,
    pub error: Option<String>,
    pub liked: Vec<i64>,
}

/// Outcome of flipping one viewer's like in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeFlip {
    pub was_liked: bool,
    pub likes: i64,
}

pub struct FeedService {
    backend: Arc<dyn Backend>,
    limit: usize,
    state: RwLock<FeedState>,
    /// Liked post ids per viewer
    liked: RwLock<HashMap<String, HashSet<i64>>>,
}

impl FeedService {
    pub fn new(backend: Arc<dyn Backend>, limit: usize) -> Self {
        Self {
            backend,
            limit,
            state: RwLock::new(FeedState::default()),
            liked: RwLock::new(HashMap::new()),
        }
    }

    /// Re-read the feed from the backend.
    ///
    /// On failure the cache is emptied and carries the load error; stale
    /// posts are never served.
    pub async fn refresh(&self) -> Result<usize> {
        match self.backend.recent_emotions(self.limit).await {
            Ok(rows) => {
                let posts = sanitize_rows(rows);
                let stats = FeedStats::from_posts(&posts, Utc::now().date_naive());
                let count = posts.len();
                self.prune_liked(&posts).await;
                *self.state.write().await = FeedState {
                    posts,
                    stats,
                    error: None,
                };
                debug!(posts = count, today = stats.today, "Feed refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Feed refresh failed");
                *self.state.write().await = FeedState {
                    error: Some(LOAD_FAILED.to_string()),
                    ..Default::default()
                };
                Err(e)
            }
        }
    }

    /// Forget likes of posts that left the feed, and viewers with none left.
    async fn prune_liked(&self, posts: &[EmotionPost]) {
        let ids: HashSet<i64> = posts.iter().map(|post| post.id).collect();
        let mut liked = self.liked.write().await;
        liked.retain(|_, set| {
            set.retain(|id| ids.contains(id));
            !set.is_empty()
        });
    }

    /// Number of viewers with a locally known liked set.
    pub async fn tracked_viewers(&self) -> usize {
        self.liked.read().await.len()
    }

    pub async fn posts(&self) -> Vec<EmotionPost> {
        self.state.read().await.posts.clone()
    }

    pub async fn stats(&self) -> FeedStats {
        self.state.read().await.stats
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Cached like counter of a post, if it is in the feed.
    pub async fn likes_of(&self, emotion_id: i64) -> Option<i64> {
        self.state
            .read()
            .await
            .posts
            .iter()
            .find(|post| post.id == emotion_id)
            .map(|post| post.likes)
    }

    /// Post ids the viewer likes, as last known locally.
    pub async fn liked_by(&self, viewer: &ViewerIp) -> HashSet<i64> {
        self.liked
            .read()
            .await
            .get(viewer.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Flip the viewer's like on a post and move its counter accordingly.
    ///
    /// The counter never drops below zero. Posts missing from the cache are
    /// treated as having zero likes.
    pub async fn flip_like(&self, emotion_id: i64, viewer: &ViewerIp) -> LikeFlip {
        let was_liked = {
            let mut liked = self.liked.write().await;
            let set = liked.entry(viewer.as_str().to_string()).or_default();
            if set.remove(&emotion_id) {
                true
            } else {
                set.insert(emotion_id);
                false
            }
        };

        let mut state = self.state.write().await;
        let likes = match state.posts.iter_mut().find(|post| post.id == emotion_id) {
            Some(post) => {
                post.likes = adjust(post.likes, was_liked);
                post.likes
            }
            None => adjust(0, was_liked),
        };

        LikeFlip { was_liked, likes }
    }

    /// The feed personalized for `viewer`.
    ///
    /// The liked set is re-read from the backend for known viewers; if that
    /// fails the last known set is used. Unknown viewers see nothing liked.
    pub async fn view(&self, viewer: &ViewerIp) -> FeedView {
        let (posts, stats, error) = {
            let state = self.state.read().await;
            (state.posts.clone(), state.stats, state.error.clone())
        };

        let liked = if viewer.is_known() && error.is_none() {
            self.sync_liked(&posts, viewer).await
        } else {
            HashSet::new()
        };

        let now = Utc::now();
        let mut liked_ids: Vec<i64> = liked.iter().copied().collect();
        liked_ids.sort_unstable();

        FeedView {
            emotions: posts
                .into_iter()
                .map(|post| PostView {
                    liked: liked.contains(&post.id),
                    message_html: post.message.as_deref().map(escape_html),
                    age: format_age(post.created_at, now),
                    post,
                })
                .collect(),
            stats,
            error,
            liked: liked_ids,
        }
    }

    async fn sync_liked(&self, posts: &[EmotionPost], viewer: &ViewerIp) -> HashSet<i64> {
        let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        match self.backend.liked_emotion_ids(&ids, viewer.as_str()).await {
            Ok(liked) => {
                self.liked
                    .write()
                    .await
                    .insert(viewer.as_str().to_string(), liked.clone());
                liked
            }
            Err(e) => {
                debug!(error = %e, viewer = %viewer, "Liked set unavailable");
                self.liked_by(viewer).await
            }
        }
    }
}

fn adjust(likes: i64, was_liked: bool) -> i64 {
    if was_liked {
        (likes - 1).max(0)
    } else {
        likes + 1
    }
}

/// Run backend rows back through input governance before serving them.
///
/// Rows whose emotion no longer validates are dropped; messages that fail
/// validation are served as absent.
pub fn sanitize_rows(rows: Vec<EmotionRow>) -> Vec<EmotionPost> {
    rows.into_iter()
        .filter_map(|row| {
            let label = process_user_input(&row.emotion, InputKind::Emotion);
            let Ok(emotion) = label.parse() else {
                warn!(id = row.id, "Skipping row with invalid emotion");
                return None;
            };
            let message = row
                .message
                .map(|message| process_user_input(&message, InputKind::Message))
                .filter(|message| !message.is_empty());

            Some(EmotionPost {
                id: row.id,
                emotion,
                message,
                likes: row.likes.unwrap_or(0).max(0),
                created_at: row.created_at,
            })
        })
        .collect()
}

/// Relative age label: "Just now", "{n}h ago", or the date.
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);
    if age.num_hours() < 1 {
        "Just now".to_string()
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}
