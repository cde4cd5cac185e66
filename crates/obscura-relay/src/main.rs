//! Obscura relay binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 127.0.0.1:8000, info logging
//! obscura-relay
//!
//! # Environment-driven (container style)
//! HOST=0.0.0.0 PORT=9000 LOG_LEVEL=debug obscura-relay
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use obscura_relay::rate_limit::{NoLimit, RateLimit, TokenBucket};
use obscura_relay::{router, Janitor, RelayState, StoreConfig};

/// Obscura zero-knowledge relay server.
#[derive(Parser, Debug)]
#[command(name = "obscura-relay")]
#[command(about = "Zero-knowledge relay for end-to-end encrypted messaging")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "plain")]
    log_format: String,

    /// Janitor sweep interval in seconds
    #[arg(long, default_value = "60")]
    sweep_interval: u64,

    /// Per-token queue cap (oldest evicted beyond this)
    #[arg(long, default_value = "1000")]
    per_token_cap: usize,

    /// Global stored-message cap (sends fail with 503 beyond this)
    #[arg(long, default_value = "100000")]
    max_messages: usize,

    /// Requests admitted per second; 0 disables rate limiting
    #[arg(long, default_value = "0")]
    rate_limit: u32,
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse()?);

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .json()
                .flatten_event(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(&args.log_level, &args.log_format)?;

    let rate_limit: Arc<dyn RateLimit> = if args.rate_limit > 0 {
        Arc::new(TokenBucket::new(args.rate_limit, 3))
    } else {
        Arc::new(NoLimit)
    };

    let state = Arc::new(RelayState::new(
        StoreConfig {
            per_token_cap: args.per_token_cap,
            max_messages: args.max_messages,
        },
        rate_limit,
    ));

    let janitor = Janitor::spawn(state.clone(), Duration::from_secs(args.sweep_interval));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(addr = %addr, error = %e, "failed to bind");
        e
    })?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        sweep_interval = args.sweep_interval,
        "relay listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    janitor.shutdown().await;
    info!("relay stopped");
    Ok(())
}
