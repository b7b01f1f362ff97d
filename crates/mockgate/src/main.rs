use anyhow::Context;
use clap::{Parser, ValueEnum};
use mockgate::config::{ListenConfig, MetricsConfig, ServerConfig};
use mockgate::{MockDispatcher, MockServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Serve canned JSON responses for configured routes
#[derive(Parser, Debug)]
#[command(name = "mockgate", author, version, about)]
struct Args {
    /// Mock configuration file (YAML or JSON) containing the routes map
    #[arg(short, long, env = "MOCKGATE_CONFIG")]
    config: PathBuf,

    #[arg(short, long, env = "MOCKGATE_PORT", default_value = "8080")]
    port: u16,

    #[arg(long, env = "MOCKGATE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Forward requests that are not mocked to this base URL
    #[arg(short, long, env = "MOCKGATE_UPSTREAM")]
    upstream: Option<String>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "MOCKGATE_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mockgate=debug"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let dispatcher = MockDispatcher::from_file(&args.config)
        .with_context(|| format!("Failed to load mocks from {}", args.config.display()))?;

    let config = ServerConfig {
        listen: ListenConfig {
            host: args.host,
            port: args.port,
        },
        metrics: MetricsConfig {
            port: args.metrics_port,
        },
        upstream: args.upstream,
    };

    let server = MockServer::new(config, dispatcher)?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
