// lib.rs - YouTube search backend with API key failover
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod search;
pub mod youtube_client;

use config::AppConfig;
use credentials::{CredentialPool, FailoverController};
use error::ConfigError;
use export::{TabularExportSink, XlsxSink};
use provider::VideoSearchProvider;
use search::{SearchOptions, SearchOrchestrator};
use std::sync::Arc;

// AppState holds the shared key pool, the search pipeline built on it, the
// outbound HTTP client and the spreadsheet writer
pub struct AppState {
    pub orchestrator: SearchOrchestrator,
    pub pool: Arc<CredentialPool>,
    pub http_client: reqwest::Client,
    pub export_sink: Arc<dyn TabularExportSink>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let pool = Arc::new(CredentialPool::new(config.api_keys.iter().cloned())?);
        let http_client = reqwest::Client::new();
        let provider = Arc::new(youtube_client::YouTubeClient::new(http_client.clone()));

        let options = SearchOptions {
            page_delay: config.page_delay,
            enrich_subscribers: config.enrich_subscribers,
            filler_seed: config.filler_seed,
        };

        Ok(Self::with_provider(pool, provider, options, http_client))
    }

    pub fn with_provider(
        pool: Arc<CredentialPool>,
        provider: Arc<dyn VideoSearchProvider>,
        options: SearchOptions,
        http_client: reqwest::Client,
    ) -> Self {
        let failover = FailoverController::new(pool.clone());
        Self {
            orchestrator: SearchOrchestrator::new(provider, failover, options),
            pool,
            http_client,
            export_sink: Arc::new(XlsxSink),
        }
    }
}
