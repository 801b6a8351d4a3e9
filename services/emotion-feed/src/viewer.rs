// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Best-effort viewer identification.
//!
//! Likes are de-duplicated per viewer IP. The IP is either taken from the
//! request (forwarded-for header, then socket peer) or, for single-viewer
//! deployments, looked up once from a public IP-echo endpoint. Anything that
//! does not pass [`validate_ip`](crate::validator::validate_ip) becomes
//! [`ViewerIp::unknown`], which disables like personalization.
//!
//! Socket peers are written out in full, so an IPv6 peer becomes eight
//! uncompressed groups and an IPv4-mapped peer becomes its IPv4 address.

use crate::config::{IpLookupConfig, ViewerMode};
use crate::error::Result;
use crate::models::ViewerIp;
use crate::validator::{process_user_input, InputKind};
use axum::http::HeaderMap;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct IpEcho {
    ip: String,
}

/// Client for a public IP-echo endpoint returning `{"ip": "..."}`.
pub struct IpLookup {
    url: String,
    client: reqwest::Client,
}

impl IpLookup {
    pub fn new(config: &IpLookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }

    /// Raw address reported by the endpoint.
    pub async fn fetch(&self) -> Result<String> {
        let echo: IpEcho = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(echo.ip)
    }

    /// Public IP of this process, or [`ViewerIp::unknown`] on any failure.
    pub async fn lookup(&self) -> ViewerIp {
        match self.fetch().await {
            Ok(ip) => from_untrusted(&ip),
            Err(e) => {
                debug!(error = %e, "IP lookup failed");
                ViewerIp::unknown()
            }
        }
    }
}

/// Turns requests into viewer identifiers.
#[derive(Debug, Clone)]
pub enum ViewerResolver {
    /// Derive the viewer from each request
    Peer,
    /// Every request is the same, already resolved viewer
    Fixed(ViewerIp),
}

impl ViewerResolver {
    /// Build the resolver for `mode`, performing the one-off lookup when
    /// the mode asks for it.
    pub async fn for_mode(mode: ViewerMode, lookup: &IpLookup) -> Self {
        match mode {
            ViewerMode::Peer => Self::Peer,
            ViewerMode::IpEcho => {
                let viewer = lookup.lookup().await;
                info!(viewer = %viewer, "Resolved viewer from IP echo");
                Self::Fixed(viewer)
            }
        }
    }

    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> ViewerIp {
        match self {
            Self::Fixed(viewer) => viewer.clone(),
            Self::Peer => from_request(headers, peer),
        }
    }
}

/// First `X-Forwarded-For` hop if present, else the socket peer.
pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> ViewerIp {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::to_string);

    match forwarded.or_else(|| peer.map(|addr| expand_ip(addr.ip()))) {
        Some(candidate) => from_untrusted(&candidate),
        None => ViewerIp::unknown(),
    }
}

/// Uncompressed text form of an address.
fn expand_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6
                .segments()
                .iter()
                .map(|segment| format!("{segment:x}"))
                .collect::<Vec<_>>()
                .join(":"),
        },
    }
}

fn from_untrusted(candidate: &str) -> ViewerIp {
    let ip = process_user_input(candidate, InputKind::Ip);
    if ip.is_empty() {
        ViewerIp::unknown()
    } else {
        ViewerIp::new(ip)
    }
}
