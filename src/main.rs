use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tube_scout::config::AppConfig;
use tube_scout::{handlers, middleware, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            tracing::error!("Add YOUTUBE_API_KEY_1 (and optionally _2, _3, ...) to your .env file");
            std::process::exit(1);
        }
    };

    tracing::info!("🔑 {} YouTube API key(s) configured", config.api_keys.len());
    tracing::info!(
        "Configuration - page delay: {}ms, subscriber lookup: {}, filler seed: {}",
        config.page_delay.as_millis(),
        if config.enrich_subscribers { "✅" } else { "❌" },
        config
            .filler_seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string())
    );

    let shared_state = match AppState::from_config(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let app = Router::new()
        .merge(handlers::search::search_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server running on http://localhost:{}", config.port);

    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,tube_scout=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,tube_scout=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::info!("📺 TubeScout starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let stats = state.pool.stats();
    let status = if stats.available > 0 { "operational" } else { "degraded" };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "keys": stats,
        "activeKey": state.pool.active_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
