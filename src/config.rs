use crate::error::ExporterError;
use crate::snapshot::Domain;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpectrumConfig {
    /// e.g. `https://spectrum.example.com:9569`
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    /// Spectrum Control usually presents a self-signed certificate
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            metrics_path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    /// `@every 5m`, `@hourly`, `@daily` or a bare duration such as `90s`
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_metrics_config_path")]
    pub metrics_config_path: String,
    #[serde(default)]
    pub domains: DomainsConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            metrics_config_path: default_metrics_config_path(),
            domains: DomainsConfig::default(),
        }
    }
}

impl CollectionConfig {
    pub fn interval(&self) -> crate::error::Result<Duration> {
        parse_schedule(&self.schedule)
    }
}

/// Enable flag and resource name filter of one domain
#[derive(Debug, Deserialize, Clone)]
pub struct DomainSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Regular expression matched case-insensitively against resource names
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: default_filter(),
        }
    }
}

/// The fixed set of collectable domains
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DomainsConfig {
    #[serde(default)]
    pub storage: DomainSettings,
    #[serde(default)]
    pub switch: DomainSettings,
    #[serde(default)]
    pub pool: DomainSettings,
}

impl DomainsConfig {
    pub fn settings(&self, domain: Domain) -> &DomainSettings {
        match domain {
            Domain::Storage => &self.storage,
            Domain::Switch => &self.switch,
            Domain::Pool => &self.pool,
        }
    }

    pub fn settings_mut(&mut self, domain: Domain) -> &mut DomainSettings {
        match domain {
            Domain::Storage => &mut self.storage,
            Domain::Switch => &mut self.switch,
            Domain::Pool => &mut self.pool,
        }
    }

    /// Enabled domains in a stable order
    pub fn enabled(&self) -> Vec<Domain> {
        Domain::ALL
            .into_iter()
            .filter(|domain| self.settings(*domain).enabled)
            .collect()
    }
}

/// Parses a collection schedule into a fixed interval
pub fn parse_schedule(schedule: &str) -> crate::error::Result<Duration> {
    let schedule = schedule.trim();
    let interval = match schedule {
        "@hourly" => Duration::from_secs(60 * 60),
        "@daily" | "@midnight" => Duration::from_secs(24 * 60 * 60),
        _ => {
            let spec = schedule
                .strip_prefix("@every")
                .map(str::trim)
                .unwrap_or(schedule);
            humantime::parse_duration(spec).map_err(|e| {
                ExporterError::Config(format!("invalid collection schedule '{}': {}", schedule, e))
            })?
        }
    };

    if interval.is_zero() {
        return Err(ExporterError::Config(format!(
            "collection schedule '{}' must be longer than zero",
            schedule
        )));
    }

    Ok(interval)
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9741
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_schedule() -> String {
    "@every 5m".to_string()
}

fn default_metrics_config_path() -> String {
    "config/metrics_conf.yaml".to_string()
}

fn default_filter() -> String {
    ".*".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SPECTRUM_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Rejects settings that would only fail once the server is running
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.spectrum.base_url.trim().is_empty() {
            return Err(ExporterError::Config("spectrum.base_url is empty".to_string()));
        }

        let path = &self.server.metrics_path;
        if !path.starts_with('/') || path == "/" || path == "/health" {
            return Err(ExporterError::Config(format!(
                "server.metrics_path '{}' must start with '/' and not be '/' or '/health'",
                path
            )));
        }

        self.collection.interval()?;

        if self.collection.domains.enabled().is_empty() {
            return Err(ExporterError::Config(
                "no collection domain is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
