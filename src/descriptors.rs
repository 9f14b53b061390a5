//! Metric Descriptor Catalog
//!
//! Maps Spectrum metric ids (storage systems, volumes, switches) and pool
//! attribute names to Prometheus metric names and help strings. Loaded once
//! at startup from a YAML file:
//!
//! ```yaml
//! metrics:
//!   storage_systems:
//!     - ibm_spectrum_metric_id: 803
//!       prometheus_name: storage_read_io_rate
//!       prometheus_help: Read I/O rate in ops/s
//!   switches:
//!     - ibm_spectrum_metric_id: 1000
//!       prometheus_name: switch_port_send_data_rate
//!       prometheus_help: Port send data rate in MiB/s
//!   pools:
//!     properties:
//!       - property_name: Capacity
//!         prometheus_name: storage_pool_capacity_gib
//!         prometheus_help: Pool capacity in GiB
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricCatalog {
    #[serde(default)]
    pub metrics: CatalogMetrics,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogMetrics {
    /// Used for both storage systems and their volumes
    #[serde(default)]
    pub storage_systems: Vec<MetricDescriptor>,
    #[serde(default)]
    pub switches: Vec<MetricDescriptor>,
    #[serde(default)]
    pub pools: PoolCatalog,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PoolCatalog {
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

/// Descriptor for a time-series metric identified by its Spectrum metric id
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    #[serde(rename = "ibm_spectrum_metric_id")]
    pub metric_id: u32,
    pub prometheus_name: String,
    pub prometheus_help: String,
}

/// Descriptor for a pool attribute exposed as a gauge
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Attribute name as returned by the API, e.g. `Used Space`
    pub property_name: String,
    pub prometheus_name: String,
    pub prometheus_help: String,
}

impl MetricCatalog {
    pub fn load(path: &str) -> Result<Self> {
        let catalog = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read metrics configuration {}", path))?;

        catalog
            .try_deserialize()
            .with_context(|| format!("Failed to parse metrics configuration {}", path))
    }

    pub fn storage_metric_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.metrics.storage_systems.iter().map(|m| m.metric_id)
    }

    pub fn switch_metric_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.metrics.switches.iter().map(|m| m.metric_id)
    }

    pub fn pool_properties(&self) -> &[PropertyDescriptor] {
        &self.metrics.pools.properties
    }
}
