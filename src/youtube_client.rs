// YouTube Data API v3 client used as the video search provider
// Docs: https://developers.google.com/youtube/v3

use crate::provider::{
    ProviderError, ProviderErrorKind, SearchPage, SearchPageQuery, VideoDetails,
    VideoSearchProvider,
};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
}

// ============================================================================
// Search & Video Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchResultItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResultItem {
    pub id: SearchResultId,
}

#[derive(Debug, Deserialize)]
pub struct SearchResultId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub struct VideoItem {
    pub id: String,
    pub snippet: VideoSnippet,
    pub statistics: Option<VideoStatistics>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "channelId", default)]
    pub channel_id: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub default: Option<ThumbnailInfo>,
    pub medium: Option<ThumbnailInfo>,
    pub high: Option<ThumbnailInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailInfo {
    pub url: String,
}

/// YouTube reports counters as strings.
#[derive(Debug, Deserialize)]
pub struct VideoStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
    pub duration: Option<String>,
}

impl VideoItem {
    pub fn into_details(self) -> VideoDetails {
        let thumbnail_url = self
            .snippet
            .thumbnails
            .and_then(|t| t.medium.or(t.default).or(t.high))
            .map(|t| t.url);

        let view_count = self
            .statistics
            .and_then(|s| s.view_count)
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);

        VideoDetails {
            id: self.id,
            channel_id: self.snippet.channel_id,
            channel_title: self.snippet.channel_title,
            title: self.snippet.title,
            description: self.snippet.description,
            thumbnail_url,
            published_at: self.snippet.published_at,
            category_id: self.snippet.category_id,
            view_count,
            duration: self
                .content_details
                .and_then(|c| c.duration)
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// Channel Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelItem {
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}

// ============================================================================
// Error Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Turn a non-2xx YouTube response into a typed provider error.
pub fn classify_error(status: u16, body: &str) -> ProviderError {
    let (message, reasons) = match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(envelope) => (
            envelope.error.message,
            envelope
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (body.to_string(), Vec::new()),
    };
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        message
    };

    let has_reason = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(&r.as_str()));

    let kind = if has_reason(&["quotaExceeded", "dailyLimitExceeded"]) || message.contains("quota") {
        ProviderErrorKind::QuotaExceeded
    } else if has_reason(&["invalidRegionCode"]) || message.contains("regionCode") {
        ProviderErrorKind::InvalidRegion
    } else if has_reason(&["keyInvalid", "keyExpired", "accessNotConfigured"])
        || message.contains("API key")
    {
        ProviderErrorKind::InvalidCredential
    } else {
        ProviderErrorKind::Other
    };

    ProviderError::new(kind, message)
}

// ============================================================================
// YouTube Client Implementation
// ============================================================================

impl YouTubeClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, YOUTUBE_API_BASE)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        api_key: &str,
        query_params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .query(query_params)
            .query(&[("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(classify_error(status.as_u16(), &error_text));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VideoSearchProvider for YouTubeClient {
    async fn search_page(
        &self,
        api_key: &str,
        query: &SearchPageQuery,
    ) -> Result<SearchPage, ProviderError> {
        let mut query_params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", query.q.clone()),
            ("order", query.order.as_str().to_string()),
            ("maxResults", query.max_results.to_string()),
        ];

        if let Some(region) = &query.region_code {
            query_params.push(("regionCode", region.clone()));
        }
        if let Some(language) = &query.relevance_language {
            query_params.push(("relevanceLanguage", language.clone()));
        }
        if let Some(after) = query.published_after {
            query_params.push(("publishedAfter", after.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(before) = query.published_before {
            query_params.push(("publishedBefore", before.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(token) = &query.page_token {
            query_params.push(("pageToken", token.clone()));
        }

        let response: SearchResponse = self.get_json("search", api_key, &query_params).await?;

        Ok(SearchPage {
            video_ids: response
                .items
                .into_iter()
                .filter_map(|item| item.id.video_id)
                .collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn video_details(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<Vec<VideoDetails>, ProviderError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query_params = [
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("id", video_ids.join(",")),
        ];
        let response: VideoListResponse = self.get_json("videos", api_key, &query_params).await?;

        Ok(response.items.into_iter().map(VideoItem::into_details).collect())
    }

    async fn channel_subscribers(
        &self,
        api_key: &str,
        channel_id: &str,
    ) -> Result<Option<u64>, ProviderError> {
        let query_params = [
            ("part", "statistics".to_string()),
            ("id", channel_id.to_string()),
        ];
        let response: ChannelListResponse = self.get_json("channels", api_key, &query_params).await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.statistics)
            .and_then(|s| s.subscriber_count)
            .and_then(|c| c.parse().ok()))
    }
}
