//! Prometheus Metrics Bridge
//!
//! Turns the cached domain snapshots into Prometheus metric families on every
//! scrape. Nothing here talks to Spectrum: [`SpectrumCollector::collect`] only
//! reads the [`SnapshotCache`], so scrapes are cheap and never wait for a
//! collection in progress.
//!
//! # Metric Families
//!
//! ## Storage (labels: name, type, storage_name)
//! - One gauge per configured `storage_systems` metric id, for storage systems
//!   (`type="storageSystem"`) and volumes (`type="volume"`, `storage_name` set
//!   to the owning storage system)
//! - `storage_system_info` - value is always 1
//!   - Labels: type, model, name, firmware, ip_address
//!
//! ## Switch (labels: name)
//! - One gauge per configured `switches` metric id
//!
//! ## Pool (labels: pool_name, storage_system)
//! - One gauge per configured pool property
//!
//! ## Exporter
//! - `storage_scrape_collector_success` - last collection of a domain succeeded (1) or failed (0)
//! - `storage_scrape_collector_duration_seconds` - duration of that collection
//!   - Labels: collector
//!
//! Storage and switch gauges carry the timestamp of the Spectrum sample they
//! were read from, since samples lag behind real time by several minutes.
//!
//! The descriptor set returned by [`SpectrumCollector::describe_metrics`] is
//! built from configuration only and does not change between scrapes.

use crate::cache::SnapshotCache;
use crate::descriptors::MetricCatalog;
use crate::error::Result;
use crate::snapshot::{Domain, DomainData, PoolResource, StorageResource, SwitchResource};
use crate::spectrum::types::Pool;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

const STORAGE_LABELS: [&str; 3] = ["name", "type", "storage_name"];
const SWITCH_LABELS: [&str; 1] = ["name"];
const POOL_LABELS: [&str; 2] = ["pool_name", "storage_system"];
const SYSTEM_INFO_LABELS: [&str; 5] = ["type", "model", "name", "firmware", "ip_address"];
const COLLECTOR_LABELS: [&str; 1] = ["collector"];

fn new_desc(name: &str, help: &str, labels: &[&str]) -> Result<Desc> {
    Ok(Desc::new(
        name.to_string(),
        help.to_string(),
        labels.iter().map(|l| l.to_string()).collect(),
        HashMap::new(),
    )?)
}

/// Prometheus collector backed by the snapshot cache
pub struct SpectrumCollector {
    cache: Arc<SnapshotCache>,
    domains: Vec<Domain>,
    storage_metrics: BTreeMap<u32, Desc>,
    switch_metrics: BTreeMap<u32, Desc>,
    pool_properties: BTreeMap<String, Desc>,
    system_info: Desc,
    scrape_success: Desc,
    scrape_duration: Desc,
}

impl SpectrumCollector {
    /// Builds the descriptors for the enabled domains from the catalog
    pub fn new(catalog: &MetricCatalog, domains: Vec<Domain>, cache: Arc<SnapshotCache>) -> Result<Self> {
        let mut storage_metrics = BTreeMap::new();
        for metric in &catalog.metrics.storage_systems {
            storage_metrics.insert(
                metric.metric_id,
                new_desc(&metric.prometheus_name, &metric.prometheus_help, &STORAGE_LABELS)?,
            );
        }

        let mut switch_metrics = BTreeMap::new();
        for metric in &catalog.metrics.switches {
            switch_metrics.insert(
                metric.metric_id,
                new_desc(&metric.prometheus_name, &metric.prometheus_help, &SWITCH_LABELS)?,
            );
        }

        let mut pool_properties = BTreeMap::new();
        for property in catalog.pool_properties() {
            if !Pool::FIELD_NAMES.contains(&property.property_name.as_str()) {
                warn!(
                    "Pool property '{}' is not a Spectrum pool attribute and will never be reported",
                    property.property_name
                );
                continue;
            }
            pool_properties.insert(
                property.property_name.clone(),
                new_desc(&property.prometheus_name, &property.prometheus_help, &POOL_LABELS)?,
            );
        }

        Ok(Self {
            cache,
            domains,
            storage_metrics,
            switch_metrics,
            pool_properties,
            system_info: new_desc("storage_system_info", "Storage System Info.", &SYSTEM_INFO_LABELS)?,
            scrape_success: new_desc(
                "storage_scrape_collector_success",
                "spectrum_exporter: Whether a collector succeeded.",
                &COLLECTOR_LABELS,
            )?,
            scrape_duration: new_desc(
                "storage_scrape_collector_duration_seconds",
                "spectrum_exporter: Duration of a collector scrape.",
                &COLLECTOR_LABELS,
            )?,
        })
    }

    fn enabled(&self, domain: Domain) -> bool {
        self.domains.contains(&domain)
    }

    /// Every descriptor a scrape may emit
    pub fn describe_metrics(&self) -> Vec<&Desc> {
        let mut descs = vec![&self.scrape_success, &self.scrape_duration];
        if self.enabled(Domain::Storage) {
            descs.push(&self.system_info);
            descs.extend(self.storage_metrics.values());
        }
        if self.enabled(Domain::Switch) {
            descs.extend(self.switch_metrics.values());
        }
        if self.enabled(Domain::Pool) {
            descs.extend(self.pool_properties.values());
        }
        descs
    }

    /// Current metric families built from the cache
    pub fn collect_metrics(&self) -> Vec<MetricFamily> {
        let mut families = FamilyBuilder::default();

        for &domain in &self.domains {
            let Some(entry) = self.cache.entry(domain) else {
                continue;
            };

            if let Some(snapshot) = &entry.snapshot {
                match &snapshot.data {
                    DomainData::Storage(resources) => self.emit_storage(resources, &mut families),
                    DomainData::Switch(resources) => self.emit_switches(resources, &mut families),
                    DomainData::Pool(resources) => self.emit_pools(resources, &mut families),
                }
            }

            let success = if entry.outcome.success { 1.0 } else { 0.0 };
            families.gauge(&self.scrape_success, &[domain.as_str()], success, None);
            families.gauge(
                &self.scrape_duration,
                &[domain.as_str()],
                entry.outcome.duration_seconds,
                None,
            );
        }

        families.finish()
    }

    fn emit_storage<'a>(&'a self, resources: &[StorageResource], families: &mut FamilyBuilder<'a>) {
        for resource in resources {
            for value in &resource.system_metrics {
                if let Some(desc) = self.storage_metrics.get(&value.metric_id) {
                    families.gauge(
                        desc,
                        &[&value.device_name, "storageSystem", ""],
                        value.value,
                        Some(value.timestamp_ms),
                    );
                }
            }

            for value in &resource.volume_metrics {
                if let Some(desc) = self.storage_metrics.get(&value.metric_id) {
                    families.gauge(
                        desc,
                        &[&value.device_name, "volume", &value.parent_device_name],
                        value.value,
                        Some(value.timestamp_ms),
                    );
                }
            }

            let system = &resource.system;
            families.gauge(
                &self.system_info,
                &[
                    &system.system_type,
                    &system.model,
                    &system.name,
                    &system.firmware,
                    &system.ip_address,
                ],
                1.0,
                None,
            );
        }
    }

    fn emit_switches<'a>(&'a self, resources: &[SwitchResource], families: &mut FamilyBuilder<'a>) {
        for resource in resources {
            for value in &resource.metrics {
                if let Some(desc) = self.switch_metrics.get(&value.metric_id) {
                    families.gauge(desc, &[&value.device_name], value.value, Some(value.timestamp_ms));
                }
            }
        }
    }

    fn emit_pools<'a>(&'a self, resources: &[PoolResource], families: &mut FamilyBuilder<'a>) {
        for resource in resources {
            for property in &resource.properties {
                if let Some(desc) = self.pool_properties.get(&property.property) {
                    families.gauge(
                        desc,
                        &[&resource.pool.name, &resource.pool.storage_system],
                        property.value,
                        None,
                    );
                }
            }
        }
    }
}

impl Collector for SpectrumCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.describe_metrics()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.collect_metrics()
    }
}

/// Groups gauges by metric name into families
#[derive(Default)]
struct FamilyBuilder<'a> {
    families: BTreeMap<&'a str, (&'a Desc, Vec<Metric>)>,
}

impl<'a> FamilyBuilder<'a> {
    /// `label_values` follow the order of the descriptor's variable labels
    fn gauge(&mut self, desc: &'a Desc, label_values: &[&str], value: f64, timestamp_ms: Option<i64>) {
        let mut labels: Vec<(&str, &str)> = desc
            .variable_labels
            .iter()
            .map(String::as_str)
            .zip(label_values.iter().copied())
            .collect();
        labels.sort_by(|a, b| a.0.cmp(b.0));

        let label_pairs: Vec<LabelPair> = labels
            .into_iter()
            .map(|(name, value)| {
                let mut pair = LabelPair::default();
                pair.set_name(name.to_string());
                pair.set_value(value.to_string());
                pair
            })
            .collect();

        let mut gauge = Gauge::default();
        gauge.set_value(value);

        let mut metric = Metric::default();
        metric.set_label(label_pairs);
        metric.set_gauge(gauge);
        if let Some(timestamp_ms) = timestamp_ms {
            metric.set_timestamp_ms(timestamp_ms);
        }

        self.families
            .entry(desc.fq_name.as_str())
            .or_insert_with(|| (desc, Vec::new()))
            .1
            .push(metric);
    }

    fn finish(self) -> Vec<MetricFamily> {
        self.families
            .into_values()
            .map(|(desc, metrics)| {
                let mut family = MetricFamily::default();
                family.set_name(desc.fq_name.clone());
                family.set_help(desc.help.clone());
                family.set_field_type(MetricType::GAUGE);
                family.set_metric(metrics);
                family
            })
            .collect()
    }
}

/// Registry exposing the Spectrum collector in text format
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
}

impl MetricsRegistry {
    pub fn new(collector: SpectrumCollector) -> Result<Self> {
        let registry = Registry::new();
        registry.register(Box::new(collector))?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
