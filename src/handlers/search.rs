// Search, export and key-monitoring endpoints

use crate::error::SearchError;
use crate::export::{build_sheet, export_filename, ExportParams};
use crate::models::search::{SearchParams, SearchRequest};
use crate::models::video::VideoRecord;
use crate::AppState;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Extension, Query},
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Exports carry every record back from the browser.
pub const EXPORT_BODY_LIMIT: usize = 50 * 1024 * 1024;
const DEFAULT_THUMBNAIL_NAME: &str = "thumbnail.jpg";

pub fn search_routes() -> Router {
    Router::new()
        .route("/api/search", get(search_videos))
        .route("/api/download-thumbnail", get(download_thumbnail))
        .route(
            "/api/download-excel",
            post(download_excel).layer(DefaultBodyLimit::max(EXPORT_BODY_LIMIT)),
        )
        .route("/api/keys/stats", get(key_stats))
}

// ============================================================================
// Search
// ============================================================================

async fn search_videos(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, SearchError> {
    let request = SearchRequest::from_params(&params);

    let result = state.orchestrator.search(&request).await;
    state.pool.log_usage_stats();

    let records = result?;
    tracing::info!("📦 Returning {} videos", records.len());

    Ok(Json(json!({
        "success": true,
        "data": records,
        "total": records.len()
    })))
}

// ============================================================================
// Thumbnail proxy
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub url: Option<String>,
    pub filename: Option<String>,
}

async fn download_thumbnail(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ThumbnailQuery>,
) -> Result<Response, SearchError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| SearchError::BadRequest("Image URL is required".to_string()))?;

    let filename = query
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_THUMBNAIL_NAME.to_string());

    let upstream = state
        .http_client
        .get(&url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| {
            tracing::error!("Thumbnail fetch failed for {}: {}", url, e);
            SearchError::Upstream("Failed to download thumbnail".to_string())
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_DISPOSITION, attachment_disposition(&filename)),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

// ============================================================================
// Spreadsheet export
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub search_results: Option<Vec<VideoRecord>>,
    #[serde(default)]
    pub search_params: ExportParams,
}

async fn download_excel(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, SearchError> {
    let records = payload
        .search_results
        .ok_or_else(|| SearchError::BadRequest("Invalid search results".to_string()))?;

    tracing::info!("📊 Exporting {} records", records.len());

    let sink = state.export_sink.clone();
    let bytes = sink.render(&build_sheet(&records))?;

    let filename = export_filename(&payload.search_params, records.len(), Utc::now(), sink.extension());
    tracing::info!("✅ Export ready: {} ({} bytes)", filename, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(sink.content_type())),
            (header::CONTENT_DISPOSITION, attachment_disposition(&filename)),
        ],
        bytes,
    )
        .into_response())
}

/// Percent-encoded so quotes and non-ASCII names stay a valid header.
fn attachment_disposition(filename: &str) -> HeaderValue {
    let encoded = urlencoding::encode(filename);
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        encoded, encoded
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// ============================================================================
// Key monitoring
// ============================================================================

async fn key_stats(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "activeKey": state.pool.active_name(),
        "stats": state.pool.stats(),
        "keys": state.pool.snapshot()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialPool;
    use crate::provider::{
        ProviderError, ProviderErrorKind, SearchPage, SearchPageQuery, VideoDetails,
        VideoSearchProvider,
    };
    use crate::search::orchestrator::SearchOptions;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Serves one page of two videos, or fails every call with quota errors.
    struct StubProvider {
        quota_exhausted: bool,
    }

    impl StubProvider {
        fn check(&self) -> Result<(), ProviderError> {
            if self.quota_exhausted {
                Err(ProviderError::new(ProviderErrorKind::QuotaExceeded, "quotaExceeded"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl VideoSearchProvider for StubProvider {
        async fn search_page(
            &self,
            _api_key: &str,
            _query: &SearchPageQuery,
        ) -> Result<SearchPage, ProviderError> {
            self.check()?;
            Ok(SearchPage {
                video_ids: vec!["low".into(), "high".into()],
                next_page_token: None,
            })
        }

        async fn video_details(
            &self,
            _api_key: &str,
            video_ids: &[String],
        ) -> Result<Vec<VideoDetails>, ProviderError> {
            self.check()?;
            Ok(video_ids
                .iter()
                .map(|id| VideoDetails {
                    id: id.clone(),
                    channel_id: "UC1".into(),
                    channel_title: "Stub".into(),
                    title: id.clone(),
                    published_at: "2024-01-01T00:00:00Z".into(),
                    view_count: if id == "high" { 900_000 } else { 200_000 },
                    duration: "PT4M".into(),
                    ..Default::default()
                })
                .collect())
        }

        async fn channel_subscribers(
            &self,
            _api_key: &str,
            _channel_id: &str,
        ) -> Result<Option<u64>, ProviderError> {
            Ok(None)
        }
    }

    fn app(quota_exhausted: bool) -> Router {
        let pool = Arc::new(CredentialPool::new(["key-one", "key-two"]).unwrap());
        let options = SearchOptions {
            page_delay: Duration::ZERO,
            enrich_subscribers: false,
            filler_seed: Some(1),
        };
        let state = AppState::with_provider(
            pool,
            Arc::new(StubProvider { quota_exhausted }),
            options,
            reqwest::Client::new(),
        );
        search_routes().layer(Extension(Arc::new(state)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_sorted_records() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/api/search?country=korea&keyword=cats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["video_id"], "high");
        assert_eq!(body["data"][1]["video_id"], "low");
    }

    #[tokio::test]
    async fn test_search_quota_exhaustion_is_429() {
        let response = app(true)
            .oneshot(Request::builder().uri("/api/search").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errorType"], "quota_exceeded");
        assert_eq!(body["keyStats"]["total"], 2);
        assert_eq!(body["keyStats"]["exhausted"], 2);
        assert_eq!(body["keyStats"]["available"], 0);
    }

    #[tokio::test]
    async fn test_thumbnail_requires_url() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/api/download-thumbnail?filename=a.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errorType"], "bad_request");
    }

    #[test]
    fn test_attachment_disposition_escapes_file_names() {
        let value = attachment_disposition("my \"best\" 썸네일.jpg");
        let value = value.to_str().unwrap();
        assert_eq!(value.matches('"').count(), 2);
        assert!(value.starts_with("attachment; filename=\"my%20%22best%22%20"));
        assert!(value.ends_with(".jpg"));
        assert!(value.contains("filename*=UTF-8''my%20%22best%22%20%EC%8D%B8"));

        let plain = attachment_disposition("thumbnail.jpg");
        assert_eq!(
            plain.to_str().unwrap(),
            "attachment; filename=\"thumbnail.jpg\"; filename*=UTF-8''thumbnail.jpg"
        );
    }

    #[tokio::test]
    async fn test_excel_requires_results() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/download-excel")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"searchParams":{"keyword":"cats"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_excel_download_is_an_xlsx_attachment() {
        let payload = json!({
            "searchResults": [{
                "youtube_channel_name": "Stub",
                "title": "Clip",
                "daily_view_count": 123456,
                "duration_seconds": 75
            }],
            "searchParams": { "keyword": "cats", "country": "korea" }
        });

        let response = app(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/download-excel")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            crate::export::XLSX_CONTENT_TYPE
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"YouTube_cats_korea_%5B1%5D_"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_key_stats_masks_secrets() {
        let response = app(false)
            .oneshot(Request::builder().uri("/api/keys/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["stats"]["total"], 2);
        assert_eq!(body["keys"].as_array().unwrap().len(), 2);

        let text = body.to_string();
        assert!(!text.contains("key-one"));
        assert!(!text.contains("key-two"));
    }
}
