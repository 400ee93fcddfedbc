// Seam between the search pipeline and the video platform API.
// The YouTube implementation lives in youtube_client.rs; tests plug in an in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderErrorKind {
    /// The key's daily quota is spent.
    QuotaExceeded,
    /// The platform rejected the `regionCode` parameter.
    InvalidRegion,
    /// The key itself is invalid, expired or blocked.
    InvalidCredential,
    Transport,
    Other,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderErrorKind::QuotaExceeded => "quota_exceeded",
            ProviderErrorKind::InvalidRegion => "invalid_region",
            ProviderErrorKind::InvalidCredential => "invalid_credential",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone)]
#[error("YouTube API error ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == ProviderErrorKind::QuotaExceeded
    }
}

/// The request URL carries the API key, so it is stripped from the message.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::new(ProviderErrorKind::Transport, err.without_url().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    ViewCount,
    Relevance,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::ViewCount => "viewCount",
            SearchOrder::Relevance => "relevance",
        }
    }
}

/// One `search.list` request. `region_code` is the only parameter the
/// failover path may rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPageQuery {
    pub q: String,
    pub order: SearchOrder,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub max_results: u32,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Merged `snippet`, `statistics` and `contentDetails` of one video.
#[derive(Debug, Clone, Default)]
pub struct VideoDetails {
    pub id: String,
    pub channel_id: String,
    pub channel_title: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub published_at: String,
    pub category_id: Option<String>,
    pub view_count: u64,
    /// ISO-8601 duration, e.g. `PT4M13S`.
    pub duration: String,
}

#[async_trait]
pub trait VideoSearchProvider: Send + Sync {
    async fn search_page(
        &self,
        api_key: &str,
        query: &SearchPageQuery,
    ) -> Result<SearchPage, ProviderError>;

    async fn video_details(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<Vec<VideoDetails>, ProviderError>;

    async fn channel_subscribers(
        &self,
        api_key: &str,
        channel_id: &str,
    ) -> Result<Option<u64>, ProviderError>;
}
