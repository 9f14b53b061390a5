//! Domain Collectors
//!
//! One collector per Spectrum domain. Each collector authenticates, lists the
//! domain's resources, applies the configured name filter and fetches the
//! per-resource data, producing the payload of a
//! [`DomainSnapshot`](crate::snapshot::DomainSnapshot).
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` containing the client and metric catalog
//! - Obtain a fresh session (never shared between domains or cycles)
//! - Fetch resources one at a time, sequentially
//! - Return `Result<DomainData>`
//!
//! # Error Handling
//!
//! Authentication, top-level listing and filter errors abort the domain.
//! Failures fetching data for a single resource are logged and that resource
//! is dropped from the snapshot; the rest of the domain is still collected.
//!
//! [`run_collection_cycle`] runs every enabled domain concurrently and only
//! writes successful results to the cache.

use crate::cache::SnapshotCache;
use crate::config::DomainsConfig;
use crate::descriptors::MetricCatalog;
use crate::error::{ExporterError, Result};
use crate::snapshot::{Domain, DomainData, DomainSnapshot, NormalizedMetricValue};
use crate::spectrum::types::MetricValue;
use crate::spectrum::SpectrumClient;
use futures_util::future::join_all;
use std::time::Instant;
use tracing::{error, info, warn};

pub mod filter;
pub mod pool;
pub mod storage;
pub mod switch;

pub use filter::NameFilter;
pub use pool::collect_pools;
pub use storage::collect_storage;
pub use switch::collect_switches;

/// Shared context passed to all collectors
///
/// All fields are immutable references, so several domains can borrow the
/// same context concurrently.
#[derive(Clone, Copy)]
pub struct CollectionContext<'a> {
    /// Spectrum API client for querying endpoints
    pub client: &'a SpectrumClient,
    /// Metric ids and pool properties to collect
    pub catalog: &'a MetricCatalog,
}

/// Result of one domain collection attempt
#[derive(Debug)]
pub struct DomainCollection {
    pub domain: Domain,
    pub elapsed_seconds: f64,
    pub result: Result<DomainData>,
}

/// Awaits a per-resource fetch, logging and discarding its error
///
/// Returns `None` when the fetch failed so the caller can skip the resource.
pub async fn skip_on_error<T, F, E>(what: &str, resource: &str, fetch: F) -> Option<T>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    match fetch.await {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("Failed to fetch {} for {}, skipping it: {}", what, resource, e);
            None
        }
    }
}

/// Reduces each series to its newest present sample
///
/// Series without any present sample are omitted.
pub fn normalize(series: Vec<MetricValue>) -> Vec<NormalizedMetricValue> {
    series
        .into_iter()
        .filter_map(|metric| {
            let (timestamp_ms, value) = metric.latest_present()?;
            Some(NormalizedMetricValue {
                metric_id: metric.metric_id,
                device_name: metric.device_name.trim().to_string(),
                parent_device_name: metric.parent_device_name.trim().to_string(),
                timestamp_ms,
                value,
            })
        })
        .collect()
}

/// Collects one domain and measures how long it took
pub async fn collect_domain(
    ctx: &CollectionContext<'_>,
    domain: Domain,
    filter: &str,
) -> DomainCollection {
    let begin = Instant::now();

    let result = match NameFilter::new(filter) {
        Ok(filter) => {
            info!("Selecting {} resources with filter: {}", domain, filter.as_str());
            match domain {
                Domain::Storage => collect_storage(ctx, &filter).await.map(DomainData::Storage),
                Domain::Switch => collect_switches(ctx, &filter).await.map(DomainData::Switch),
                Domain::Pool => collect_pools(ctx, &filter).await.map(DomainData::Pool),
            }
        }
        Err(e) => Err(e),
    };

    DomainCollection {
        domain,
        elapsed_seconds: begin.elapsed().as_secs_f64(),
        result,
    }
}

/// Runs every enabled domain concurrently and commits the results
///
/// Successful domains replace their cached snapshot; failed domains keep
/// whatever was cached before and only have the failure recorded. Returns an
/// error naming the failed domains if any domain aborted.
pub async fn run_collection_cycle(
    client: &SpectrumClient,
    catalog: &MetricCatalog,
    domains: &DomainsConfig,
    cache: &SnapshotCache,
) -> Result<()> {
    let ctx = CollectionContext { client, catalog };

    let jobs = domains
        .enabled()
        .into_iter()
        .map(|domain| collect_domain(&ctx, domain, &domains.settings(domain).filter));
    let collections = join_all(jobs).await;

    let mut failures = Vec::new();
    for collection in collections {
        let domain = collection.domain;
        let elapsed = collection.elapsed_seconds;

        match collection.result {
            Ok(data) => {
                info!(
                    "Collected {} domain: {} resources in {:.2}s",
                    domain,
                    data.resource_count(),
                    elapsed
                );
                cache.put(
                    domain,
                    DomainSnapshot {
                        data,
                        collection_duration_seconds: elapsed,
                    },
                );
            }
            Err(e) => {
                error!("Failed to collect {} domain, keeping previous snapshot: {}", domain, e);
                cache.record_failure(domain, elapsed);
                failures.push(format!("{}: {}", domain, e));
            }
        }
    }

    if !failures.is_empty() {
        return Err(ExporterError::Collection(failures.join("; ")));
    }

    Ok(())
}
