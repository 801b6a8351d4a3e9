// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Emotion Feed
//!
//! Anonymous visitors share one of eight emotions with an optional short
//! message and browse a live feed of recent posts, liking at most once per
//! post per viewer. All persistence lives in a hosted PostgREST backend;
//! this crate provides:
//!
//! - Input validation and denylist sanitization of visitor text
//! - Sliding window rate limiting (5 submissions, 20 likes per minute)
//! - Optimistic like toggling with a two-write fallback
//! - A cached, periodically refreshed feed personalized per viewer IP

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod likes;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod share;
pub mod tasks;
pub mod validator;
pub mod viewer;

pub use config::Config;
pub use error::{AppError, Result};
pub use limiter::{RateLimitResult, RateLimiter};
pub use validator::{
    process_user_input, sanitize_input, validate_emotion, validate_ip, validate_message,
    InputKind, ValidationResult,
};
