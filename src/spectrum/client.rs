//! IBM Spectrum Control REST Client
//!
//! Typed wrappers over the Spectrum Control `/srm/REST/api/v1` endpoints used
//! by the collectors.
//!
//! # Architecture
//!
//! - **Authentication**: form login at `/srm/j_security_check`, cookie session
//! - **Inventory**: `StorageSystems`, `StorageSystems/{id}/Volumes`, `Switches`, `Pools`
//! - **Performance**: `StorageSystems/Performance`, `StorageSystems/{id}/Volumes/Performance`,
//!   `Switches/Performance`, filtered by [`PerformanceQuery`]
//!
//! # Example
//!
//! ```no_run
//! use spectrum_exporter::config::SpectrumConfig;
//! use spectrum_exporter::spectrum::SpectrumClient;
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SpectrumConfig {
//!     base_url: "https://spectrum.example.com:9569".to_string(),
//!     username: "monitor".to_string(),
//!     password: SecretString::from("secret"),
//!     verify_ssl: false,
//!     request_timeout_seconds: 300,
//! };
//!
//! let client = SpectrumClient::new(config)?;
//! let session = client.authenticate().await?;
//! let pools = client.list_pools(&session).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::SpectrumConfig;
use crate::error::Result;
use crate::spectrum::gateway::{decode_json, decode_time_series_envelope, ApiGateway, Session};
use crate::spectrum::types::*;
use secrecy::SecretString;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

const STORAGE_SYSTEMS: &str = "/srm/REST/api/v1/StorageSystems";
const STORAGE_SYSTEMS_PERFORMANCE: &str = "/srm/REST/api/v1/StorageSystems/Performance";
const SWITCHES: &str = "/srm/REST/api/v1/Switches";
const SWITCHES_PERFORMANCE: &str = "/srm/REST/api/v1/Switches/Performance";
const POOLS: &str = "/srm/REST/api/v1/Pools";

fn volumes_path(storage_system_id: &str) -> String {
    format!("{}/{}/Volumes", STORAGE_SYSTEMS, storage_system_id)
}

fn volumes_performance_path(storage_system_id: &str) -> String {
    format!("{}/{}/Volumes/Performance", STORAGE_SYSTEMS, storage_system_id)
}

/// Query parameters shared by every performance call of one domain collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceQuery {
    /// Milliseconds since the Unix epoch
    pub start_time_ms: i64,
    /// Comma-separated metric ids
    pub metrics: String,
    pub granularity: &'static str,
}

impl PerformanceQuery {
    /// Requests the given metric ids for the window `[now - lookback, now]`
    /// at raw sample granularity
    pub fn since<I>(lookback: Duration, metric_ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        Self {
            start_time_ms: now_ms - lookback.as_millis() as i64,
            metrics: metric_ids
                .into_iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(","),
            granularity: "sample",
        }
    }

    /// Encodes the query, optionally restricted to one device id
    pub fn params(&self, ids: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("startTime", self.start_time_ms.to_string()),
            ("metrics", self.metrics.clone()),
            ("granularity", self.granularity.to_string()),
        ];
        if let Some(ids) = ids {
            params.push(("ids", ids.to_string()));
        }
        params
    }
}

/// Client for the Spectrum Control REST API
///
/// Stateless apart from the HTTP connection pool: every collection obtains
/// its own [`Session`] through [`SpectrumClient::authenticate`], so the client
/// can be shared across concurrently running domain collections.
pub struct SpectrumClient {
    gateway: ApiGateway,
    username: String,
    password: SecretString,
}

impl SpectrumClient {
    pub fn new(config: SpectrumConfig) -> Result<Self> {
        let gateway = ApiGateway::new(&config)?;
        Ok(Self {
            gateway,
            username: config.username,
            password: config.password,
        })
    }

    /// Logs in with the configured credentials
    pub async fn authenticate(&self) -> Result<Session> {
        self.gateway
            .authenticate(&self.username, &self.password)
            .await
    }

    /// List all storage systems
    pub async fn list_storage_systems(&self, session: &Session) -> Result<Vec<StorageSystem>> {
        let raw = self.gateway.get(STORAGE_SYSTEMS, session, &[]).await?;
        let systems: Vec<StorageSystem> = decode_json(&raw)?;
        info!("Number of storage systems retrieved: {}", systems.len());
        Ok(systems)
    }

    /// Aggregated performance of one storage system
    pub async fn storage_system_performance(
        &self,
        session: &Session,
        query: &PerformanceQuery,
        storage_system_id: &str,
    ) -> Result<Vec<MetricValue>> {
        let raw = self
            .gateway
            .get(
                STORAGE_SYSTEMS_PERFORMANCE,
                session,
                &query.params(Some(storage_system_id)),
            )
            .await?;
        let series = decode_time_series_envelope(&raw)?;
        info!(
            "Metrics received for storage system {}: {}",
            storage_system_id,
            series.len()
        );
        Ok(series)
    }

    /// Volume inventory of one storage system
    pub async fn list_volumes(&self, session: &Session, storage_system_id: &str) -> Result<Vec<Volume>> {
        let raw = self
            .gateway
            .get(&volumes_path(storage_system_id), session, &[])
            .await?;
        let volumes: Vec<Volume> = decode_json(&raw)?;
        info!(
            "Volumes retrieved for storage system {}: {}",
            storage_system_id,
            volumes.len()
        );
        Ok(volumes)
    }

    /// Per-volume performance of one storage system
    pub async fn volume_performance(
        &self,
        session: &Session,
        query: &PerformanceQuery,
        storage_system_id: &str,
    ) -> Result<Vec<MetricValue>> {
        let raw = self
            .gateway
            .get(
                &volumes_performance_path(storage_system_id),
                session,
                &query.params(None),
            )
            .await?;
        decode_time_series_envelope(&raw)
    }

    /// List all switches
    pub async fn list_switches(&self, session: &Session) -> Result<Vec<Switch>> {
        let raw = self.gateway.get(SWITCHES, session, &[]).await?;
        let switches: Vec<Switch> = decode_json(&raw)?;
        info!("Number of switches retrieved: {}", switches.len());
        Ok(switches)
    }

    /// Aggregated performance of one switch
    pub async fn switch_performance(
        &self,
        session: &Session,
        query: &PerformanceQuery,
        switch_id: &str,
    ) -> Result<Vec<MetricValue>> {
        let raw = self
            .gateway
            .get(SWITCHES_PERFORMANCE, session, &query.params(Some(switch_id)))
            .await?;
        let series = decode_time_series_envelope(&raw)?;
        info!("Metrics received for switch {}: {}", switch_id, series.len());
        Ok(series)
    }

    /// List all pools
    pub async fn list_pools(&self, session: &Session) -> Result<Vec<Pool>> {
        let raw = self.gateway.get(POOLS, session, &[]).await?;
        let pools: Vec<Pool> = decode_json(&raw)?;
        info!("Number of pools retrieved: {}", pools.len());
        Ok(pools)
    }
}
