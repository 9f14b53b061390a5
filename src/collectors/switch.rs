//! Switch Collector
//!
//! Collects aggregated performance for every switch whose name matches the
//! filter, one `GET /Switches/Performance?ids=<id>` per switch.

use super::{normalize, skip_on_error, CollectionContext, NameFilter};
use crate::error::Result;
use crate::snapshot::SwitchResource;
use crate::spectrum::PerformanceQuery;
use std::time::Duration;

/// Switches report with more latency than storage systems
pub const SWITCH_LOOKBACK: Duration = Duration::from_secs(20 * 60);

pub async fn collect_switches(
    ctx: &CollectionContext<'_>,
    filter: &NameFilter,
) -> Result<Vec<SwitchResource>> {
    let session = ctx.client.authenticate().await?;
    let switches = ctx.client.list_switches(&session).await?;
    let switches = filter.select(switches, |s| s.name.as_str());

    let query = PerformanceQuery::since(SWITCH_LOOKBACK, ctx.catalog.switch_metric_ids());

    let mut resources = Vec::with_capacity(switches.len());
    for switch in switches {
        let Some(metrics) = skip_on_error(
            "switch metrics",
            &switch.name,
            ctx.client.switch_performance(&session, &query, &switch.id),
        )
        .await
        else {
            continue;
        };

        resources.push(SwitchResource {
            metrics: normalize(metrics),
            switch,
        });
    }

    Ok(resources)
}
