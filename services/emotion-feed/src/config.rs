// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the emotion feed service.
//!
//! Defaults mirror the budgets the feed was designed around: 5 submissions
//! and 20 likes per minute, a 50 post feed refreshed every 30 seconds.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the emotion feed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by CORS (default: http://localhost:3000)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Hosted backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Public IP-echo endpoint configuration
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// How viewers are identified for likes
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Feed configuration
    #[serde(default)]
    pub feed: FeedConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Hosted backend (PostgREST-style) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`. `None` selects the
    /// in-process backend.
    #[serde(default)]
    pub url: Option<String>,

    /// Anonymous API key sent as `apikey` and bearer token
    #[serde(default)]
    pub anon_key: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// IP-echo endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// Endpoint returning `{"ip": "..."}`
    #[serde(default = "default_ip_lookup_url")]
    pub url: String,

    /// Request timeout in seconds (default: 5)
    #[serde(default = "default_ip_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

/// Strategy for deriving the viewer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerMode {
    /// Forwarded-for header, then the socket peer address
    #[default]
    Peer,
    /// Public IP looked up once at startup, shared by every request
    IpEcho,
}

impl std::str::FromStr for ViewerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peer" => Ok(Self::Peer),
            "ip-echo" | "ip_echo" => Ok(Self::IpEcho),
            other => Err(format!("unknown viewer mode: {other}")),
        }
    }
}

/// Viewer identification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub mode: ViewerMode,
}

/// Budget for a single limiter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum admitted requests per identifier within the window
    pub max_requests: u32,

    /// Trailing window in milliseconds
    pub window_ms: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Emotion submissions (default: 5 per minute)
    #[serde(default = "default_submission_limit")]
    pub submission: LimitConfig,

    /// Like toggles (default: 20 per minute)
    #[serde(default = "default_like_limit")]
    pub like: LimitConfig,

    /// Interval between cleanup sweeps in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of recent posts served (default: 50)
    #[serde(default = "default_feed_limit")]
    pub limit: usize,

    /// Background refresh interval in seconds (default: 30)
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Config {
    /// Reject settings the background tasks cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.feed.refresh_secs == 0 {
            return Err(AppError::Config(
                "feed refresh interval must be at least 1 second".to_string(),
            ));
        }
        if self.limits.cleanup_interval_secs == 0 {
            return Err(AppError::Config(
                "limiter cleanup interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_ip_lookup_timeout_secs() -> u64 {
    5
}

fn default_submission_limit() -> LimitConfig {
    LimitConfig {
        max_requests: 5,
        window_ms: 60_000,
    }
}

fn default_like_limit() -> LimitConfig {
    LimitConfig {
        max_requests: 20,
        window_ms: 60_000,
    }
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_feed_limit() -> usize {
    50
}

fn default_refresh_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            backend: BackendConfig::default(),
            ip_lookup: IpLookupConfig::default(),
            viewer: ViewerConfig::default(),
            limits: LimitsConfig::default(),
            feed: FeedConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            url: default_ip_lookup_url(),
            timeout_secs: default_ip_lookup_timeout_secs(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            submission: default_submission_limit(),
            like: default_like_limit(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl IpLookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LimitConfig {
    /// Get the rate window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl LimitsConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl FeedConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_feed_budgets() {
        let config = Config::default();
        assert_eq!(config.limits.submission.max_requests, 5);
        assert_eq!(config.limits.like.max_requests, 20);
        assert_eq!(config.limits.like.window(), Duration::from_secs(60));
        assert_eq!(config.feed.limit, 50);
        assert_eq!(config.feed.refresh_interval(), Duration::from_secs(30));
        assert!(config.backend.url.is_none());
        assert_eq!(config.viewer.mode, ViewerMode::Peer);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"backend": {"url": "https://demo.supabase.co", "anon_key": "k"},
                "viewer": {"mode": "ip-echo"}}"#,
        )
        .unwrap();

        assert_eq!(config.backend.url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.viewer.mode, ViewerMode::IpEcho);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.metrics.path, "/metrics");
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.feed.refresh_secs = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = Config::default();
        config.limits.cleanup_interval_secs = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_viewer_mode_from_str() {
        assert_eq!("peer".parse::<ViewerMode>(), Ok(ViewerMode::Peer));
        assert_eq!("IP-ECHO".parse::<ViewerMode>(), Ok(ViewerMode::IpEcho));
        assert!("session".parse::<ViewerMode>().is_err());
    }
}
