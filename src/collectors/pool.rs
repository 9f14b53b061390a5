//! Pool Collector
//!
//! Pools have no performance series. Instead the configured pool attributes
//! (e.g. `Capacity`, `Used Space`) are parsed from the inventory listing into
//! numbers.
//!
//! # Projection rules
//! - Attributes missing from the pool schema or empty on a pool are skipped
//! - Thousands separators (`,`) are stripped before parsing as `f64`
//! - A value that still fails to parse is logged and skipped for that pool only

use super::{CollectionContext, NameFilter};
use crate::descriptors::PropertyDescriptor;
use crate::error::Result;
use crate::snapshot::{PoolResource, PropertyValue};
use crate::spectrum::types::Pool;
use tracing::warn;

pub async fn collect_pools(
    ctx: &CollectionContext<'_>,
    filter: &NameFilter,
) -> Result<Vec<PoolResource>> {
    let session = ctx.client.authenticate().await?;
    let pools = ctx.client.list_pools(&session).await?;
    let pools = filter.select(pools, |p| p.name.as_str());

    let properties = ctx.catalog.pool_properties();

    Ok(pools
        .into_iter()
        .map(|pool| PoolResource {
            properties: project_properties(&pool, properties),
            pool,
        })
        .collect())
}

/// Parses the configured attributes of a pool into numbers
pub fn project_properties(pool: &Pool, properties: &[PropertyDescriptor]) -> Vec<PropertyValue> {
    properties
        .iter()
        .filter_map(|descriptor| {
            let raw = pool.field(&descriptor.property_name)?;
            if raw.is_empty() {
                return None;
            }

            match raw.replace(',', "").trim().parse::<f64>() {
                Ok(value) => Some(PropertyValue {
                    property: descriptor.property_name.clone(),
                    value,
                }),
                Err(e) => {
                    warn!(
                        "Failed to convert {} '{}' of pool {}: {}",
                        descriptor.property_name, raw, pool.name, e
                    );
                    None
                }
            }
        })
        .collect()
}
