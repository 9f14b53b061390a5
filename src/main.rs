use anyhow::Result;
use clap::Parser;
use spectrum_exporter::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Spectrum Control base URL (overrides config)
    #[arg(long, env = "SPECTRUM_BASE_URL")]
    base_url: Option<String>,

    /// Spectrum Control user (overrides config)
    #[arg(long, env = "SPECTRUM_USER")]
    user: Option<String>,

    /// Spectrum Control password (overrides config)
    #[arg(long, env = "SPECTRUM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Path of the metric descriptor catalog (overrides config)
    #[arg(long, env = "METRIC_CONFIG_PATH")]
    metric_config_path: Option<String>,

    /// Collection schedule, e.g. "@every 5m" (overrides config)
    #[arg(long, env = "COLLECTION_INTERVAL")]
    collection_interval: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting IBM Spectrum Control Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    if let Some(base_url) = args.base_url {
        config.spectrum.base_url = base_url;
    }
    if let Some(user) = args.user {
        config.spectrum.username = user;
    }
    if let Some(password) = args.password {
        config.spectrum.password = secrecy::SecretString::new(password.into());
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = args.metric_config_path {
        config.collection.metrics_config_path = path;
    }
    if let Some(schedule) = args.collection_interval {
        config.collection.schedule = schedule;
    }

    info!("Configuration loaded successfully");
    info!("Spectrum Control: {}", config.spectrum.base_url);
    info!(
        "Metrics endpoint: http://{}:{}{}",
        config.server.addr, config.server.port, config.server.metrics_path
    );

    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
