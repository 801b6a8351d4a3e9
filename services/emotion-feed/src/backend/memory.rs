// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-process backend.
//!
//! Stands in for the hosted backend when none is configured, and gives tests
//! a backend whose procedure availability and failures can be switched.

use super::Backend;
use crate::error::{AppError, Result};
use crate::models::{EmotionRow, LikeRecord, NewEmotionPost};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Most recent operation names kept in the log.
const OPERATION_LOG_LIMIT: usize = 256;

#[derive(Debug, Default)]
struct Tables {
    emotions: Vec<EmotionRow>,
    likes: HashSet<LikeRecord>,
    next_id: i64,
}

/// Backend holding both tables in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    /// Recent operation names in call order
    operations: RwLock<VecDeque<&'static str>>,
    /// Operation forced to fail
    failing: RwLock<Option<&'static str>>,
    rpc_available: AtomicBool,
    offline: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
            operations: RwLock::new(VecDeque::with_capacity(OPERATION_LOG_LIMIT)),
            failing: RwLock::new(None),
            rpc_available: AtomicBool::new(true),
            offline: AtomicBool::new(false),
        }
    }

    /// Make `toggle_emotion_like` fail, forcing callers onto the fallback.
    pub fn set_rpc_available(&self, available: bool) {
        self.rpc_available.store(available, Ordering::SeqCst);
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make one named operation fail, or none.
    pub async fn fail_operation(&self, operation: Option<&'static str>) {
        *self.failing.write().await = operation;
    }

    /// Insert a row as-is, returning its id. Bypasses input governance.
    pub async fn seed(&self, mut row: EmotionRow) -> i64 {
        let mut tables = self.tables.write().await;
        row.id = tables.next_id;
        tables.next_id += 1;
        let id = row.id;
        tables.emotions.push(row);
        id
    }

    pub async fn likes_of(&self, emotion_id: i64) -> Option<i64> {
        self.tables
            .read()
            .await
            .emotions
            .iter()
            .find(|row| row.id == emotion_id)
            .map(|row| row.likes.unwrap_or(0))
    }

    pub async fn has_like(&self, like: &LikeRecord) -> bool {
        self.tables.read().await.likes.contains(like)
    }

    pub async fn rows(&self) -> Vec<EmotionRow> {
        self.tables.read().await.emotions.clone()
    }

    /// The most recent operations, oldest first.
    pub async fn operations(&self) -> Vec<&'static str> {
        self.operations.read().await.iter().copied().collect()
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        {
            let mut log = self.operations.write().await;
            if log.len() == OPERATION_LOG_LIMIT {
                log.pop_front();
            }
            log.push_back(operation);
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Backend(format!("{operation}: backend offline")));
        }
        if *self.failing.read().await == Some(operation) {
            return Err(AppError::Backend(format!("{operation}: forced failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert_emotion(&self, post: &NewEmotionPost) -> Result<()> {
        self.enter("insert_emotion").await?;
        self.seed(EmotionRow {
            id: 0,
            emotion: post.emotion.to_string(),
            message: post.message.clone(),
            likes: Some(0),
            created_at: post.created_at,
        })
        .await;
        Ok(())
    }

    async fn recent_emotions(&self, limit: usize) -> Result<Vec<EmotionRow>> {
        self.enter("recent_emotions").await?;
        let mut rows = self.tables.read().await.emotions.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn liked_emotion_ids(&self, ids: &[i64], user_ip: &str) -> Result<HashSet<i64>> {
        self.enter("liked_emotion_ids").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|like| like.user_ip == user_ip && ids.contains(&like.emotion_id))
            .map(|like| like.emotion_id)
            .collect())
    }

    async fn toggle_like(&self, like: &LikeRecord) -> Result<()> {
        self.enter("toggle_like").await?;
        if !self.rpc_available.load(Ordering::SeqCst) {
            return Err(AppError::Backend(
                "function toggle_emotion_like does not exist".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let delta = if tables.likes.remove(like) {
            -1
        } else {
            tables.likes.insert(like.clone());
            1
        };
        if let Some(row) = tables.emotions.iter_mut().find(|row| row.id == like.emotion_id) {
            row.likes = Some((row.likes.unwrap_or(0) + delta).max(0));
        }
        Ok(())
    }

    async fn set_likes(&self, emotion_id: i64, likes: i64) -> Result<()> {
        self.enter("set_likes").await?;
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.emotions.iter_mut().find(|row| row.id == emotion_id) {
            row.likes = Some(likes);
        }
        Ok(())
    }

    async fn insert_like(&self, like: &LikeRecord) -> Result<()> {
        self.enter("insert_like").await?;
        if !self.tables.write().await.likes.insert(like.clone()) {
            return Err(AppError::Backend(format!(
                "duplicate like for emotion {} from {}",
                like.emotion_id, like.user_ip
            )));
        }
        Ok(())
    }

    async fn delete_like(&self, like: &LikeRecord) -> Result<()> {
        self.enter("delete_like").await?;
        self.tables.write().await.likes.remove(like);
        Ok(())
    }
}
