//! Normalized Collection Data
//!
//! Types produced by the domain collectors and stored in the
//! [`SnapshotCache`](crate::cache::SnapshotCache). A [`DomainSnapshot`] is
//! immutable once built; the cache only ever swaps whole snapshots.

use crate::spectrum::types::{Pool, StorageSystem, Switch};
use std::collections::HashMap;
use std::fmt;

/// One of the three independently collected metric categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Storage,
    Switch,
    Pool,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Storage, Domain::Switch, Domain::Pool];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Storage => "storage",
            Domain::Switch => "switch",
            Domain::Pool => "pool",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest present reading of one metric on one device
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetricValue {
    pub metric_id: u32,
    pub device_name: String,
    pub parent_device_name: String,
    /// Source sample time in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub value: f64,
}

/// A storage system together with its volume inventory and metrics
#[derive(Debug, Clone)]
pub struct StorageResource {
    pub system: StorageSystem,
    /// Volume id -> Volume Unique ID
    pub volumes: HashMap<String, String>,
    pub system_metrics: Vec<NormalizedMetricValue>,
    pub volume_metrics: Vec<NormalizedMetricValue>,
}

#[derive(Debug, Clone)]
pub struct SwitchResource {
    pub switch: Switch,
    pub metrics: Vec<NormalizedMetricValue>,
}

/// A configured pool attribute parsed into a number
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    pub property: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct PoolResource {
    pub pool: Pool,
    pub properties: Vec<PropertyValue>,
}

/// Domain-specific payload of a snapshot
#[derive(Debug, Clone)]
pub enum DomainData {
    Storage(Vec<StorageResource>),
    Switch(Vec<SwitchResource>),
    Pool(Vec<PoolResource>),
}

impl DomainData {
    pub fn domain(&self) -> Domain {
        match self {
            DomainData::Storage(_) => Domain::Storage,
            DomainData::Switch(_) => Domain::Switch,
            DomainData::Pool(_) => Domain::Pool,
        }
    }

    /// Number of top-level resources (storage systems, switches or pools)
    pub fn resource_count(&self) -> usize {
        match self {
            DomainData::Storage(r) => r.len(),
            DomainData::Switch(r) => r.len(),
            DomainData::Pool(r) => r.len(),
        }
    }
}

/// Result of one successful collection of a domain
#[derive(Debug, Clone)]
pub struct DomainSnapshot {
    pub data: DomainData,
    pub collection_duration_seconds: f64,
}

impl DomainSnapshot {
    pub fn domain(&self) -> Domain {
        self.data.domain()
    }
}

/// Bookkeeping for the most recent collection attempt of a domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionOutcome {
    pub success: bool,
    pub duration_seconds: f64,
}
