//! CLI entry point for the tabrip tool.

use std::io::{IsTerminal, stderr};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use tabrip_core::{
    CdpBodyFetcher, Chrome, LaunchOptions, Pipeline, PipelineOptions, build_default_site_registry,
};
use tracing::{debug, error, info, warn};

mod cli;
mod config;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout stays clean for shell composition.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let Some(url) = args.url.clone() else {
        error!("Missing URL. Please provide the gallery listing with --url");
        std::process::exit(1);
    };

    let file_config = match config::load_file_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            error!("failed to load config file: {error:#}");
            std::process::exit(1);
        }
    };
    let settings = config::Settings::resolve(&args, &file_config);

    let registry = build_default_site_registry();
    let strategy = match registry.for_url(&url) {
        Ok(strategy) => strategy,
        Err(error) => {
            error!(%error, "cannot rip this URL");
            std::process::exit(1);
        }
    };
    info!(site = strategy.name(), url = %url, "starting rip");

    let chrome = Arc::new(
        Chrome::launch(&LaunchOptions {
            headless: settings.headless,
            ..LaunchOptions::default()
        })
        .await?,
    );
    let fetcher = Arc::new(CdpBodyFetcher::new(
        Arc::clone(&chrome),
        settings.fetch_timeout,
    ));
    let pipeline = Pipeline::new(
        Arc::clone(&chrome),
        fetcher,
        PipelineOptions {
            output_dir: settings.output_dir.clone(),
            delay_override: settings.delay_override,
        },
    );

    let use_spinner = !args.quiet && stderr().is_terminal();
    let (spinner, stop) = progress::spawn_progress_ui(use_spinner, pipeline.stats());

    let result = pipeline.run(&url, strategy).await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = spinner {
        let _ = handle.await;
    }

    if let Err(error) = chrome.close().await {
        warn!(%error, "browser did not shut down cleanly");
    }

    let report = result?;

    info!(
        saved = report.completed(),
        failed = report.failed(),
        skipped = report.skipped(),
        "rip complete"
    );
    for failure in report.failures() {
        warn!(
            url = %failure.url,
            file = %failure.file_name,
            error = %failure.error,
            "item was not downloaded"
        );
    }

    Ok(())
}
