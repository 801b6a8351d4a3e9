// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Emotion submissions.

use crate::backend::Backend;
use crate::error::{AppError, Result};
use crate::feed::FeedService;
use crate::likes::ANONYMOUS;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::models::{Emotion, NewEmotionPost};
use crate::validator::{process_user_input, validate_emotion, validate_message, InputKind};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Submission as sent by a visitor.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct ShareService {
    backend: Arc<dyn Backend>,
    feed: Arc<FeedService>,
    limiter: Arc<RateLimiter>,
}

impl ShareService {
    pub fn new(
        backend: Arc<dyn Backend>,
        feed: Arc<FeedService>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            backend,
            feed,
            limiter,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Validate, rate limit, sanitize and store one submission.
    ///
    /// There is no visitor identity, so every submission draws from the same
    /// budget.
    pub async fn submit(&self, request: &ShareRequest) -> Result<NewEmotionPost> {
        if !validate_emotion(&request.emotion) {
            return Err(AppError::Validation(
                "Please select a valid emotion.".to_string(),
            ));
        }

        let message = request.message.as_deref().unwrap_or_default();
        if !validate_message(message) {
            return Err(AppError::Validation(
                "Message contains invalid content. Please check your input.".to_string(),
            ));
        }

        if let RateLimitResult::Limited { retry_after } = self.limiter.check(ANONYMOUS).await {
            info!(retry_after_secs = retry_after.as_secs(), "Submission rate limited");
            return Err(AppError::RateLimited { retry_after });
        }

        let emotion: Emotion = process_user_input(&request.emotion, InputKind::Emotion)
            .parse()
            .map_err(|()| AppError::Validation("Invalid emotion selected.".to_string()))?;
        let message = process_user_input(message, InputKind::Message);
        let message = Some(message.trim().to_string()).filter(|m| !m.is_empty());

        let post = NewEmotionPost {
            emotion,
            message,
            created_at: Utc::now(),
        };
        self.backend.insert_emotion(&post).await?;
        info!(emotion = %post.emotion, has_message = post.message.is_some(), "Emotion shared");

        if let Err(e) = self.feed.refresh().await {
            debug!(error = %e, "Feed refresh after submission failed");
        }

        Ok(post)
    }
}
