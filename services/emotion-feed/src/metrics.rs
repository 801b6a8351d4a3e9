// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submissions and likes.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    likes: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "emotion_feed_submissions_total",
                "Emotion submissions by outcome",
            ),
            &["outcome"],
        )?;
        let likes = IntCounterVec::new(
            Opts::new("emotion_feed_likes_total", "Like toggles by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(likes.clone()))?;

        Ok(Self {
            registry,
            submissions,
            likes,
        })
    }

    pub fn record_submission(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_like(&self, outcome: &str) {
        self.likes.with_label_values(&[outcome]).inc();
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
