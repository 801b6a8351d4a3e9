// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Data models shared between the backend client and the HTTP layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight emotions a visitor can share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Happy,
    Sad,
    Excited,
    Calm,
    Anxious,
    Grateful,
    Frustrated,
    Hopeful,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Anxious,
        Emotion::Grateful,
        Emotion::Frustrated,
        Emotion::Hopeful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Excited => "Excited",
            Self::Calm => "Calm",
            Self::Anxious => "Anxious",
            Self::Grateful => "Grateful",
            Self::Frustrated => "Frustrated",
            Self::Hopeful => "Hopeful",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive label match.
impl FromStr for Emotion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|emotion| emotion.as_str() == s)
            .ok_or(())
    }
}

/// A shared emotion as served to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionPost {
    pub id: i64,
    pub emotion: Emotion,
    pub message: Option<String>,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// A row of the `emotions` table as returned by the backend, before the
/// input governance layer has looked at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionRow {
    pub id: i64,
    pub emotion: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `emotions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmotionPost {
    pub emotion: Emotion,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One viewer's like of one post. Unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeRecord {
    pub emotion_id: i64,
    pub user_ip: String,
}

/// Counters shown above the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    pub total: usize,
    pub today: usize,
}

impl FeedStats {
    /// Count posts overall and those created on `today` (UTC date).
    pub fn from_posts(posts: &[EmotionPost], today: NaiveDate) -> Self {
        Self {
            total: posts.len(),
            today: posts
                .iter()
                .filter(|post| post.created_at.date_naive() == today)
                .count(),
        }
    }
}

/// Best-effort viewer identifier.
///
/// Derived from a public IP, so viewers behind the same NAT share one
/// identity and therefore one like per post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewerIp(String);

impl ViewerIp {
    pub const UNKNOWN: &'static str = "unknown";

    /// Wrap an already validated address.
    pub fn new(ip: impl Into<String>) -> Self {
        Self(ip.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_known(&self) -> bool {
        !self.0.is_empty() && self.0 != Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
