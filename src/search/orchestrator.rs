// Paged collection of search results through the failover controller

use super::query::build_page_query;
use crate::credentials::FailoverController;
use crate::error::SearchError;
use crate::models::search::SearchRequest;
use crate::models::video::VideoRecord;
use crate::provider::VideoSearchProvider;
use crate::search::duration::{parse_iso8601_duration, DurationCategory};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Pause between result pages to soften bursts against the API.
    pub page_delay: Duration,
    /// Look up channel subscriber counts (one extra call per record).
    pub enrich_subscribers: bool,
    /// Seed for the no-keyword filler term. `None` draws from the thread RNG.
    pub filler_seed: Option<u64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(500),
            enrich_subscribers: true,
            filler_seed: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    pub pages: usize,
    pub duplicates_skipped: usize,
    pub filtered_out: usize,
}

pub struct SearchOrchestrator {
    provider: Arc<dyn VideoSearchProvider>,
    failover: FailoverController,
    options: SearchOptions,
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn VideoSearchProvider>,
        failover: FailoverController,
        options: SearchOptions,
    ) -> Self {
        Self {
            provider,
            failover,
            options,
        }
    }

    pub fn failover(&self) -> &FailoverController {
        &self.failover
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<VideoRecord>, SearchError> {
        self.search_with_summary(request).await.map(|(records, _)| records)
    }

    /// Collect up to `request.max_results` records sorted by view count.
    pub async fn search_with_summary(
        &self,
        request: &SearchRequest,
    ) -> Result<(Vec<VideoRecord>, SearchSummary), SearchError> {
        let mut query = match self.options.filler_seed {
            Some(seed) => build_page_query(request, &mut StdRng::seed_from_u64(seed), Utc::now()),
            None => build_page_query(request, &mut rand::thread_rng(), Utc::now()),
        };

        tracing::info!(
            country = %request.country,
            q = %query.q,
            order = query.order.as_str(),
            region = query.region_code.as_deref().unwrap_or("none"),
            max_results = request.max_results,
            "🔍 Starting video search"
        );

        let mut results: Vec<VideoRecord> = Vec::with_capacity(request.max_results);
        let mut seen: HashSet<String> = HashSet::new();
        let mut summary = SearchSummary::default();

        while results.len() < request.max_results {
            let provider = self.provider.clone();
            let page_query = query.clone();
            let (page, effective_region) = self
                .failover
                .execute_with_region(query.region_code.clone(), move |lease, region| {
                    let provider = provider.clone();
                    let mut page_query = page_query.clone();
                    page_query.region_code = region;
                    async move { provider.search_page(lease.secret(), &page_query).await }
                })
                .await?;

            if effective_region.is_none() && query.region_code.is_some() {
                tracing::warn!(
                    "⚠️ '{}' search degraded to a worldwide search",
                    request.country
                );
            }
            query.region_code = effective_region;
            summary.pages += 1;

            if page.video_ids.is_empty() {
                tracing::debug!("Empty result page, stopping");
                break;
            }
            tracing::debug!("Page {}: {} videos", summary.pages, page.video_ids.len());

            let provider = self.provider.clone();
            let ids = page.video_ids.clone();
            let details = self
                .failover
                .execute_with_failover(move |lease| {
                    let provider = provider.clone();
                    let ids = ids.clone();
                    async move { provider.video_details(lease.secret(), &ids).await }
                })
                .await?;

            for video in details {
                if seen.contains(&video.id) {
                    tracing::debug!("🔄 Skipping duplicate video {}", video.id);
                    summary.duplicates_skipped += 1;
                    continue;
                }

                if !request.accepts_view_count(video.view_count) {
                    summary.filtered_out += 1;
                    continue;
                }

                let category = DurationCategory::from_seconds(parse_iso8601_duration(&video.duration));
                if !request.accepts_duration(category) {
                    summary.filtered_out += 1;
                    continue;
                }

                let subscribers = if self.options.enrich_subscribers {
                    self.subscriber_count(&video.channel_id).await
                } else {
                    None
                };

                seen.insert(video.id.clone());
                results.push(VideoRecord::from_details(video, subscribers));

                if results.len() >= request.max_results {
                    break;
                }
            }

            match page.next_page_token {
                Some(token) if results.len() < request.max_results => {
                    query.page_token = Some(token);
                    if !self.options.page_delay.is_zero() {
                        tokio::time::sleep(self.options.page_delay).await;
                    }
                }
                _ => break,
            }
        }

        // Stable: equal view counts keep discovery order.
        results.sort_by(|a, b| b.view_count.cmp(&a.view_count));

        tracing::info!(
            results = results.len(),
            pages = summary.pages,
            duplicates = summary.duplicates_skipped,
            filtered = summary.filtered_out,
            "✅ Search complete"
        );

        Ok((results, summary))
    }

    /// Subscriber lookups are best effort; a failure leaves the count empty.
    async fn subscriber_count(&self, channel_id: &str) -> Option<u64> {
        let provider = self.provider.clone();
        let channel = channel_id.to_string();
        let result = self
            .failover
            .execute_with_failover(move |lease| {
                let provider = provider.clone();
                let channel = channel.clone();
                async move { provider.channel_subscribers(lease.secret(), &channel).await }
            })
            .await;

        match result {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Subscriber lookup failed for {}: {}", channel_id, e);
                None
            }
        }
    }
}
