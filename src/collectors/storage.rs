//! Storage System Collector
//!
//! Collects aggregated storage system performance plus per-volume
//! performance for every storage system whose name matches the filter.
//!
//! # Requests per storage system
//! - `GET /StorageSystems/Performance?ids=<id>` - system-level series
//! - `GET /StorageSystems/<id>/Volumes` - volume inventory
//! - `GET /StorageSystems/<id>/Volumes/Performance` - volume-level series
//!
//! The metric ids requested come from the `storage_systems` catalog section
//! and apply to both systems and volumes. Storage systems are queried one at
//! a time because Spectrum sometimes omits series when asked for all systems
//! at once.

use super::{normalize, skip_on_error, CollectionContext, NameFilter};
use crate::error::Result;
use crate::snapshot::StorageResource;
use crate::spectrum::PerformanceQuery;
use std::time::Duration;

/// Storage samples arrive with a few minutes of delay
pub const STORAGE_LOOKBACK: Duration = Duration::from_secs(10 * 60);

/// Collects all matching storage systems
///
/// Fails only when authentication or listing the storage systems fails; a
/// storage system whose metrics or volumes cannot be fetched is left out.
pub async fn collect_storage(
    ctx: &CollectionContext<'_>,
    filter: &NameFilter,
) -> Result<Vec<StorageResource>> {
    let session = ctx.client.authenticate().await?;
    let systems = ctx.client.list_storage_systems(&session).await?;
    let systems = filter.select(systems, |s| s.name.as_str());

    let query = PerformanceQuery::since(STORAGE_LOOKBACK, ctx.catalog.storage_metric_ids());

    let mut resources = Vec::with_capacity(systems.len());
    for system in systems {
        let Some(system_metrics) = skip_on_error(
            "storage system metrics",
            &system.name,
            ctx.client
                .storage_system_performance(&session, &query, &system.id),
        )
        .await
        else {
            continue;
        };

        let Some(volumes) = skip_on_error(
            "volume list",
            &system.name,
            ctx.client.list_volumes(&session, &system.id),
        )
        .await
        else {
            continue;
        };

        let Some(volume_metrics) = skip_on_error(
            "volume metrics",
            &system.name,
            ctx.client.volume_performance(&session, &query, &system.id),
        )
        .await
        else {
            continue;
        };

        resources.push(StorageResource {
            volumes: volumes
                .into_iter()
                .map(|v| (v.id, v.volume_unique_id))
                .collect(),
            system_metrics: normalize(system_metrics),
            volume_metrics: normalize(volume_metrics),
            system,
        });
    }

    Ok(resources)
}
