//! IBM Spectrum Control Prometheus Exporter
//!
//! Periodically collects storage system, volume, switch and pool data from
//! the IBM Spectrum Control REST API and exposes it in Prometheus format.
//!
//! # Overview
//!
//! Collection and scraping are decoupled. A background loop authenticates
//! against Spectrum Control on a schedule, collects every enabled domain and
//! stores one snapshot per domain in a cache. Scrapes only read that cache,
//! so a slow Spectrum instance never slows down Prometheus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    HTTPS/JSON      ┌──────────────────────────────┐
//! │  Spectrum   │ ◄────────────────  │  Exporter                    │
//! │  Control    │  session cookie    │  ┌───────────┐  ┌─────────┐  │     HTTP    ┌────────────┐
//! └─────────────┘                    │  │Collectors │─►│  Cache  │  │ ◄─────────► │ Prometheus │
//!                                    │  └───────────┘  └────┬────┘  │  /metrics   └────────────┘
//!                                    │                 ┌────▼────┐  │
//!                                    │                 │ Metrics │  │
//!                                    │                 └─────────┘  │
//!                                    └──────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`spectrum`] - REST client, session handling and API type definitions
//! - [`collectors`] - Per-domain collection and the collection cycle
//! - [`cache`] - Latest snapshot per domain
//! - [`metrics`] - Prometheus collector reading the cache
//! - [`descriptors`] - Metric id and pool property catalog
//! - [`server`] - HTTP server and collection loop
//! - [`config`] - Configuration management
//! - [`snapshot`] - Collected data model
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use spectrum_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collectors;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod metrics;
pub mod server;
pub mod snapshot;
pub mod spectrum;
