// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! PostgREST client for the hosted backend.

use super::Backend;
use crate::config::BackendConfig;
use crate::error::{AppError, Result};
use crate::models::{EmotionRow, LikeRecord, NewEmotionPost};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Response;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const EMOTIONS: &str = "emotions";
const EMOTION_LIKES: &str = "emotion_likes";
const TOGGLE_LIKE_RPC: &str = "rpc/toggle_emotion_like";

#[derive(Debug, Deserialize)]
struct LikedRow {
    emotion_id: i64,
}

/// Backend reached over the PostgREST HTTP interface.
pub struct RestBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl RestBackend {
    /// Create a client for the project at `config.url`.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let project_url = config
            .url
            .as_deref()
            .ok_or_else(|| AppError::Config("backend URL is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.anon_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.anon_key))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url: rest_base(project_url)?,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn insert_emotion(&self, post: &NewEmotionPost) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint(EMOTIONS)?)
            .header("Prefer", "return=minimal")
            .json(&[post])
            .send()
            .await?;

        ensure_success(response).await?;
        debug!(emotion = %post.emotion, "Inserted emotion");
        Ok(())
    }

    async fn recent_emotions(&self, limit: usize) -> Result<Vec<EmotionRow>> {
        let response = self
            .client
            .get(self.endpoint(EMOTIONS)?)
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let rows: Vec<EmotionRow> = ensure_success(response).await?.json().await?;
        debug!(rows = rows.len(), "Fetched recent emotions");
        Ok(rows)
    }

    async fn liked_emotion_ids(&self, ids: &[i64], user_ip: &str) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(self.endpoint(EMOTION_LIKES)?)
            .query(&[
                ("select", "emotion_id".to_string()),
                ("emotion_id", format!("in.({id_list})")),
                ("user_ip", format!("eq.{user_ip}")),
            ])
            .send()
            .await?;

        let rows: Vec<LikedRow> = ensure_success(response).await?.json().await?;
        Ok(rows.into_iter().map(|row| row.emotion_id).collect())
    }

    async fn toggle_like(&self, like: &LikeRecord) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint(TOGGLE_LIKE_RPC)?)
            .json(like)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn set_likes(&self, emotion_id: i64, likes: i64) -> Result<()> {
        let response = self
            .client
            .patch(self.endpoint(EMOTIONS)?)
            .query(&[("id", format!("eq.{emotion_id}"))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "likes": likes }))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn insert_like(&self, like: &LikeRecord) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint(EMOTION_LIKES)?)
            .header("Prefer", "return=minimal")
            .json(like)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_like(&self, like: &LikeRecord) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(EMOTION_LIKES)?)
            .query(&[
                ("emotion_id", format!("eq.{}", like.emotion_id)),
                ("user_ip", format!("eq.{}", like.user_ip)),
            ])
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// `https://xyz.supabase.co` -> `https://xyz.supabase.co/rest/v1/`
fn rest_base(project_url: &str) -> Result<Url> {
    let mut project = project_url.trim().to_string();
    if !project.ends_with('/') {
        project.push('/');
    }
    Ok(Url::parse(&project)?.join("rest/v1/")?)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::Config("backend key is not a valid header value".to_string()))
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Backend(format!("{status}: {body}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_base() {
        assert_eq!(
            rest_base("https://demo.supabase.co").unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/"
        );
        assert_eq!(
            rest_base("http://localhost:54321/").unwrap().as_str(),
            "http://localhost:54321/rest/v1/"
        );
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let result = RestBackend::new(&BackendConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_endpoints_resolve_under_rest_root() {
        let backend = RestBackend::new(&BackendConfig {
            url: Some("https://demo.supabase.co".to_string()),
            anon_key: "anon".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            backend.endpoint(TOGGLE_LIKE_RPC).unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/rpc/toggle_emotion_like"
        );
    }
}
