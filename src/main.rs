//! Adkeep main entry point
//!
//! This is the command-line interface for the Adkeep ad backup tool.

use adkeep::config::{load_effective_config, Config, ConfigOverrides};
use adkeep::crawler::Coordinator;
use adkeep::output::print_statistics;
use adkeep::url::listing_page_url;
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Adkeep: incremental backups of your classified ads
///
/// Adkeep downloads every ad of a marketplace user, or the ads given on the
/// command line, into one directory per ad. Each directory holds the ad text
/// in `Adlisting.txt` and the ad's images. Images already on disk are not
/// downloaded again.
#[derive(Parser, Debug)]
#[command(name = "adkeep")]
#[command(version = "1.0.0")]
#[command(about = "Incremental backups of classified ads", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// User id whose ads are backed up
    #[arg(short, long, value_name = "ID")]
    user: Option<u64>,

    /// Output directory, may contain {{.Year}}, {{.Month}} and {{.Day}}
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<String>,

    /// Back up at most this many ads of the user (0 = all)
    #[arg(short, long, value_name = "NUM")]
    limit: Option<usize>,

    /// Overwrite images even if they already exist
    #[arg(short, long)]
    force: bool,

    /// Ignore failed image downloads
    #[arg(short, long)]
    ignore_errors: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and planned work without downloading
    #[arg(long)]
    dry_run: bool,

    /// Ad URLs to back up instead of the user's whole listing
    #[arg(value_name = "AD_URL")]
    adlinks: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            user: self.user,
            outdir: self.outdir.clone(),
            limit: self.limit,
            force: self.force,
            ignore_errors: self.ignore_errors,
            adlinks: self.adlinks.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("adkeep=info,warn"),
            1 => EnvFilter::new("adkeep=debug,info"),
            2 => EnvFilter::new("adkeep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, source) = load_effective_config(cli.config.as_deref(), cli.overrides())
        .context("failed to load configuration")?;

    match &source {
        Some(path) => tracing::debug!("Configuration loaded from: {}", path.display()),
        None => tracing::debug!("No configuration file found, using defaults"),
    }

    if cli.dry_run {
        handle_dry_run(&config, source.as_deref());
        return Ok(());
    }

    handle_backup(config).await
}

/// Handles the --dry-run mode: shows the effective configuration and planned work
fn handle_dry_run(config: &Config, source: Option<&Path>) {
    println!("=== Adkeep Dry Run ===\n");

    match source {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (defaults)"),
    }

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing path: {}", config.site.listing_path);
    println!("  User agent: {}", config.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.outdir);
    println!("  Ad name template: {}", config.ad_name_template);
    println!("  Force overwrite: {}", config.force);
    println!("  Ignore image errors: {}", config.ignore_errors);

    println!("\nRequests:");
    println!(
        "  Throttle: {}-{}ms",
        config.throttle.min_ms, config.throttle.max_ms
    );
    println!(
        "  Retries: {} (base delay {}ms)",
        config.retry.max_retries, config.retry.base_delay_ms
    );

    println!();
    if !config.adlinks.is_empty() {
        println!("Would back up {} ad(s):", config.adlinks.len());
        for link in &config.adlinks {
            println!("  - {}", link);
        }
    } else if config.user > 0 {
        println!(
            "Would crawl all ads of user {} starting at {}",
            config.user,
            listing_page_url(
                &config.site.base_url,
                &config.site.listing_path,
                config.user,
                1
            )
        );
        if config.limit > 0 {
            println!("  and back up at most {} of them", config.limit);
        }
    } else {
        println!("Nothing to do: invalid or no user id specified");
    }
}

/// Handles the main backup operation
async fn handle_backup(config: Config) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(config)?;
    let stats = coordinator.run().await?;

    print_statistics(&stats, coordinator.outdir());
    Ok(())
}
