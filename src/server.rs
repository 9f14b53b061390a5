//! HTTP Server and Collection Loop
//!
//! This module wires the exporter together and serves the scrape endpoint.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing the metrics path, `/health` and `/`
//! - **Collection Loop**: Background task that runs a collection cycle on the
//!   configured schedule and commits the results to the snapshot cache
//! - **State Management**: Client, catalog, cache and registry shared through `Arc`
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET <metrics_path>` - Prometheus metrics in text format, built from the cache
//! - `GET /health` - 200 once any enabled domain has a snapshot, 503 before that
//!
//! # Startup
//!
//! The first collection cycle runs before the listener is bound, so the very
//! first scrape already sees data. A failing first cycle is logged and the
//! server starts anyway; later cycles may succeed.

use crate::cache::SnapshotCache;
use crate::collectors;
use crate::config::{Config, DomainsConfig};
use crate::descriptors::MetricCatalog;
use crate::metrics::{MetricsRegistry, SpectrumCollector};
use crate::snapshot::Domain;
use crate::spectrum::SpectrumClient;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    client: Arc<SpectrumClient>,
    catalog: Arc<MetricCatalog>,
    domains: Arc<DomainsConfig>,
    cache: Arc<SnapshotCache>,
    registry: MetricsRegistry,
    metrics_path: String,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let period = config.collection.interval()?;

    let catalog = Arc::new(MetricCatalog::load(&config.collection.metrics_config_path)?);
    info!(
        "Loaded metric catalog: {} storage metrics, {} switch metrics, {} pool properties",
        catalog.metrics.storage_systems.len(),
        catalog.metrics.switches.len(),
        catalog.pool_properties().len()
    );

    let domains = Arc::new(config.collection.domains.clone());
    let cache = Arc::new(SnapshotCache::new());
    let collector = SpectrumCollector::new(&catalog, domains.enabled(), cache.clone())?;
    let registry = MetricsRegistry::new(collector)?;
    let client = Arc::new(SpectrumClient::new(config.spectrum.clone())?);

    let state = AppState {
        client,
        catalog,
        domains,
        cache,
        registry,
        metrics_path: config.server.metrics_path.clone(),
    };

    info!("Running initial collection");
    run_cycle(&state).await;

    let collection_state = state.clone();
    tokio::spawn(async move {
        collection_loop(collection_state, period).await;
    });

    let app = Router::new()
        .route("/", get(root_handler))
        .route(&config.server.metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!(
        "Metrics available at http://{}{}",
        addr, config.server.metrics_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn collection_loop(state: AppState, period: Duration) {
    // The first cycle already ran during startup
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Collecting every {}", humantime::format_duration(period));

    loop {
        ticker.tick().await;
        run_cycle(&state).await;
    }
}

async fn run_cycle(state: &AppState) {
    if let Err(e) = collectors::run_collection_cycle(
        &state.client,
        &state.catalog,
        &state.domains,
        &state.cache,
    )
    .await
    {
        error!("Collection cycle incomplete: {}", e);
    }
}

/// True once at least one enabled domain has been collected successfully
pub fn is_ready(cache: &SnapshotCache, domains: &[Domain]) -> bool {
    domains.iter().any(|domain| cache.contains(*domain))
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(format!(
        r#"<html>
<head><title>Spectrum Exporter</title></head>
<body>
<h1>IBM Spectrum Control Prometheus Exporter</h1>
<p><a href="{}">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
        state.metrics_path
    ))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.registry.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if is_ready(&state.cache, &state.domains.enabled()) {
        (StatusCode::OK, "OK")
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Spectrum Control data not collected yet",
        )
    }
}
