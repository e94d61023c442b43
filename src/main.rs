//! `foss-licenses` — list a project's third-party dependencies together with a
//! link to each one's license file, as HTML and CSV reports.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and load the config file ([`config::load_config`]).
//! 2. Create the output directory and load the license cache ([`cache`]).
//! 3. Verify the hosting API token ([`api::github::GitHubClient::verify_token`]); exit `1` if invalid.
//! 4. Scan the dependency tree ([`scanner`]).
//! 5. Resolve each dependency's license file URL ([`resolver`], [`fetcher`], [`repository`]).
//! 6. Write the HTML and CSV reports and print a summary ([`report`]).

mod api;
mod cache;
mod cli;
mod config;
mod fetcher;
mod models;
mod repository;
mod resolver;
mod report;
mod scanner;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use api::github::GitHubClient;
use cache::LicenseCache;
use cli::Cli;
use config::load_config;
use fetcher::LicenseFetcher;
use repository::HostRegistry;
use resolver::Resolver;
use scanner::detect_scanner;

const CACHE_FILE: &str = "license-cache.json";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let root = std::env::current_dir().context("Cannot determine the working directory")?;

    // Resolve project path
    let start = cli
        .start
        .canonicalize()
        .unwrap_or_else(|_| cli.start.clone());

    let mut config = load_config(&start, cli.config.as_deref())?;
    cli.apply(&mut config);

    // Output directory holds both the reports and the cache
    let out_dir = root.join(&config.output.dir);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("Error creating output directory {}", out_dir.display()))?;

    let cache = LicenseCache::load(out_dir.join(CACHE_FILE)).await;

    let client = GitHubClient::new(
        &config.fetch.api_base,
        &cli.github_auth_token,
        config.fetch.timeout(),
    )?;

    if let Err(e) = client.verify_token().await {
        tracing::error!("{e}");
        tracing::error!("Exiting due to invalid token.");
        std::process::exit(1);
    }
    tracing::info!("Authentication token is valid.");

    let Some(scanner) = detect_scanner(&start) else {
        tracing::error!(
            "No supported project manifest found in {}",
            start.display()
        );
        return Ok(());
    };

    let options = config.scan.to_options(start.clone());
    let records = match scanner.scan(&options) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Error scanning dependencies: {e:#}");
            return Ok(());
        }
    };
    tracing::info!(dependencies = records.len(), "Dependency scan complete");

    let hosts = HostRegistry::github()?;
    let fetcher = LicenseFetcher::new(client, config.fetch.retry_policy())?;
    let mut resolver = Resolver::new(&hosts, &cache, &fetcher);

    let pb = if cli.quiet || cli.no_progress {
        None
    } else {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        resolver = resolver.with_progress(pb.clone());
        Some(pb)
    };

    let resolved = resolver.resolve_all(records).await;

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    if let Err(e) = cache.flush().await {
        tracing::warn!("Error saving cache: {e:#}");
    }
    tracing::debug!(entries = cache.len().await, path = %cache.path().display(), "Cache saved");

    let files = report::write_reports(&resolved, &out_dir, &chrono::Local::now())?;
    report::terminal::render(&resolved, &files, &start, cli.verbose, cli.quiet);

    Ok(())
}

/// Install the `tracing` subscriber; `RUST_LOG` takes precedence over `--verbose`/`--quiet`.
fn init_logging(cli: &Cli) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(cli.log_filter())
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
