use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use throttler_core::app::{App, AppBuilder};
use throttler_core::config::ThrottlerConfig;
use throttler_core::impls::{
    DryRunInstaller, EnvLocale, HttpParamsSource, InMemoryStore, JsonFileStore, StaticLocale,
};
use throttler_core::ports::{KeyValueStore, LocaleSource};

#[derive(Parser, Debug)]
#[command(name = "throttler")]
#[command(version, about = "Cohort-gated add-on installation", long_about = None)]
struct Args {
    /// JSON config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "throttler_core=debug" (RUST_LOG wins when set)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Keep state in memory instead of the state file
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check at startup, then on every idle interval until Ctrl-C
    Run,
    /// Run a single check and print the report
    Check,
    /// Print per-candidate lifecycle state
    Status,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => ThrottlerConfig::load(path)?,
        None => ThrottlerConfig::default(),
    };

    match args.command {
        Command::Config => print_json(&config),
        Command::Check => {
            let app = build_app(&config, args.ephemeral).await?;
            let report = app.orchestrator().run_check().await;
            print_json(&report)
        }
        Command::Status => {
            let app = build_app(&config, args.ephemeral).await?;
            let status = app.orchestrator().status().await?;
            print_json(&status)
        }
        Command::Run => {
            let app = build_app(&config, args.ephemeral).await?;
            run(app, config.idle_interval()).await
        }
    }
}

async fn build_app(config: &ThrottlerConfig, ephemeral: bool) -> Result<App> {
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(InMemoryStore::new())
    } else {
        let store = JsonFileStore::open(&config.store_path)
            .await
            .with_context(|| format!("failed to open state file {}", config.store_path.display()))?;
        Arc::new(store)
    };

    let source = HttpParamsSource::new(&config.params_url, config.request_timeout())
        .context("failed to initialize params client")?;

    let locale: Arc<dyn LocaleSource> = match &config.locale {
        Some(locale) => Arc::new(StaticLocale::new(locale.clone())),
        None => Arc::new(EnvLocale),
    };

    AppBuilder::new()
        .store(store)
        .params_source(Arc::new(source))
        .installer(Arc::new(DryRunInstaller))
        .locale(locale)
        .cache_policy(config.cache_policy())
        .candidates(config.candidates.clone())
        .build()
        .context("failed to build throttler")
}

/// idle 通知の代わりに interval で IdleLoop を駆動する
async fn run(app: App, interval: Duration) -> Result<()> {
    let (notifier, notifications) = mpsc::channel(1);
    let idle_loop = app.idle_loop(notifications);

    let ticker = tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        // The first tick completes immediately; the startup check covers it.
        ticks.tick().await;
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if notifier.try_send(()).is_err() {
                        debug!("previous check still running, dropping idle notification");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }
        // dropping the notifier closes the idle loop
    });

    let checks = idle_loop.run().await;
    ticker.await.context("idle ticker panicked")?;
    info!(checks, "throttler stopped");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
