mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use maple_status_core::{
    fetch_or_absent, HttpStatusFetcher, MonitorLoop, TelegramNotifier, STATUS_SELECTOR,
};

use crate::config::{AppConfig, Credentials};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION
    } else {
        // Called once for clap; the string lives for the whole process.
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Relay MapleLegends server status changes to a Telegram chat.
#[derive(Parser)]
#[command(name = "maple-status", version = version_string(), about)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the status page forever and notify Telegram on changes.
    Watch {
        /// Status page URL. Overrides config file.
        #[arg(long)]
        url: Option<String>,

        /// Seconds between polls. Overrides config file.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Fetch the status once and print it. Sends nothing.
    Check {
        /// Status page URL. Overrides config file.
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (url, interval) = match &cli.command {
        Commands::Watch { url, interval } => (url.clone(), *interval),
        Commands::Check { url } => (url.clone(), None),
    };

    let app_config = match AppConfig::load(cli.config.as_deref())
        .and_then(|c| c.with_overrides(url, interval))
    {
        Ok(c) => {
            init_tracing(&c.server.log_format);
            if let Some(path) = &cli.config {
                tracing::info!(path = %path.display(), "Loaded config file");
            }
            c
        }
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Watch { .. } => run_watch(app_config).await,
        Commands::Check { .. } => run_check(app_config).await,
    }
}

async fn run_watch(app_config: AppConfig) -> ExitCode {
    let credentials = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        bot_token = %config::redact(&credentials.bot_token),
        chat_id = %credentials.chat_id,
        "Loaded Telegram credentials"
    );

    let monitor_config = app_config.monitor.to_monitor_config();
    let client = match HttpStatusFetcher::build_client(monitor_config.request_timeout) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let fetcher = Arc::new(HttpStatusFetcher::with_client(client.clone()));
    let notifier = Arc::new(TelegramNotifier::with_api_base(
        client,
        &app_config.telegram.api_base,
        credentials.bot_token,
    ));

    println!(
        "{} {}",
        style("maple-status").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("  {} {}", style("url:     ").dim(), style(&monitor_config.url).bold());
    println!(
        "  {} {}s",
        style("interval:").dim(),
        monitor_config.poll_interval.as_secs()
    );
    println!("  {} {}", style("chat:    ").dim(), credentials.chat_id);
    println!();

    let mut monitor = MonitorLoop::new(monitor_config, fetcher, notifier, credentials.chat_id);

    // run() never returns, so leaving the select means a signal arrived.
    tokio::select! {
        _ = monitor.run() => {}
        _ = shutdown_signal() => {}
    }

    tracing::info!(
        last_status = monitor.last_status().map(|s| s.as_str()).unwrap_or("unknown"),
        "Shutdown signal received, monitor stopped"
    );
    ExitCode::SUCCESS
}

async fn run_check(app_config: AppConfig) -> ExitCode {
    let monitor_config = app_config.monitor.to_monitor_config();
    let fetcher = match HttpStatusFetcher::from_config(&monitor_config) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    match fetch_or_absent(&fetcher, &monitor_config.url).await {
        Some(status) => {
            println!(
                "{} {}",
                style("MapleLegends server status:").dim(),
                style(status).green().bold()
            );
            ExitCode::SUCCESS
        }
        None => {
            println!(
                "{} no `{}` found at {}",
                style("unavailable:").red().bold(),
                STATUS_SELECTOR,
                monitor_config.url
            );
            ExitCode::from(2)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
