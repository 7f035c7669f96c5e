//! ssrf-check - validate outbound URLs from the command line.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cortex_ssrf_guard::{GuardConfig, SecurityMode, UrlGuard, validate_url_sync};

/// Check URLs against the SSRF guard
#[derive(Parser)]
#[command(name = "ssrf-check")]
#[command(about = "Check whether URLs are safe outbound request targets")]
#[command(version)]
struct Args {
    /// URLs to check
    #[arg(required = true)]
    urls: Vec<String>,

    /// Security mode (strict, moderate, permissive). Defaults to the
    /// environment configuration.
    #[arg(short, long)]
    mode: Option<SecurityMode>,

    /// Skip DNS resolution and check the literal hostname only
    #[arg(long)]
    offline: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let config = match GuardConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load guard config from environment: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let guard = UrlGuard::new(config);
    let mut blocked = false;

    for url in &args.urls {
        let result = if args.offline {
            validate_url_sync(url, Some(args.mode.unwrap_or(guard.config().api_mode)))
        } else {
            let mode = args.mode.unwrap_or(guard.config().webhook_mode);
            guard.validate_with_mode(url, mode).await
        };

        if result.valid {
            println!("ALLOW {}", url);
        } else {
            blocked = true;
            println!("BLOCK {}: {}", url, result.reason.unwrap_or_default());
        }
    }

    if blocked {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
