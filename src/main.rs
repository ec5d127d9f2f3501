//! agent-audit main entry point
//!
//! This is the command-line interface for the agent-friendliness auditor.

use agent_audit::audit::{discover_urls, run_audit};
use agent_audit::browser::{BrowserPool, ChromiumLauncher, PoolConfig};
use agent_audit::config::load_config_with_hash;
use agent_audit::context::AuditContext;
use agent_audit::output::print_summary;
use agent_audit::wellknown::check_well_known_files;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// URLs listed by --dry-run before the list is elided
const DRY_RUN_LISTED: usize = 25;

/// agent-audit: how well does a site work for AI agents?
///
/// agent-audit discovers a site's pages from its sitemap, audits each page as
/// served and as rendered by a headless browser, scores the results and
/// collects markup patterns from the best pages.
#[derive(Parser, Debug)]
#[command(name = "agent-audit")]
#[command(version)]
#[command(about = "Audits websites for agent-friendliness", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Audit this root or sitemap URL instead of the configured target
    #[arg(long, value_name = "URL")]
    target: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the URLs that would be audited, without rendering
    #[arg(long, conflicts_with = "check_files")]
    dry_run: bool,

    /// Check the site's well-known agent files and exit
    #[arg(long, conflicts_with = "dry_run")]
    check_files: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let mut ctx = AuditContext::new(config, config_hash)?;
    if let Some(target) = &cli.target {
        ctx = ctx.with_target(target)?;
    }

    if cli.dry_run {
        handle_dry_run(&ctx).await
    } else if cli.check_files {
        handle_check_files(&ctx).await
    } else {
        handle_audit(ctx).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("agent_audit=info,warn"),
            1 => EnvFilter::new("agent_audit=debug,info"),
            2 => EnvFilter::new("agent_audit=trace,debug"),
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

/// Handles --dry-run: shows the configuration and the discovered URL set
async fn handle_dry_run(ctx: &AuditContext) -> anyhow::Result<()> {
    let config = &ctx.config;
    println!("=== agent-audit Dry Run ===\n");

    println!("Audit:");
    println!("  Target: {}", ctx.target);
    println!("  Sitemap depth: {}", config.audit.sitemap_depth);
    println!("  Max concurrent pages: {}", config.audit.max_concurrent_pages);
    println!("  Include all languages: {}", config.audit.include_all_languages);
    if let Some(max) = config.audit.max_urls {
        println!("  Max URLs: {}", max);
    }

    println!("\nBrowser:");
    println!("  Pool size: {}", config.browser.pool_size);
    println!("  Restart after pages: {}", config.browser.restart_after_pages);
    println!("  Effective concurrency: {}", ctx.concurrency());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Write CSV: {}", config.output.write_csv);

    let entries = discover_urls(ctx, None).await?;
    println!("\nDiscovered URLs ({}):", entries.len());
    for entry in entries.iter().take(DRY_RUN_LISTED) {
        println!("  - {}", entry.url);
    }
    if entries.len() > DRY_RUN_LISTED {
        println!("  ... and {} more", entries.len() - DRY_RUN_LISTED);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would audit {} URLs", entries.len());
    Ok(())
}

/// Handles --check-files: reports each well-known file as pass or fail
async fn handle_check_files(ctx: &AuditContext) -> anyhow::Result<()> {
    let origin = ctx.site_root();
    println!("=== Well-Known Files: {} ===\n", origin);

    let checks = check_well_known_files(&ctx.fetcher, &ctx.retry, &origin).await;
    for check in &checks {
        let mark = if check.passed { "✓" } else { "✗" };
        let status = check
            .status
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        match &check.error {
            Some(error) => println!("{} {} [{}] {}", mark, check.path, status, error),
            None => println!("{} {} [{}]", mark, check.path, status),
        }
    }

    let passed = checks.iter().filter(|c| c.passed).count();
    println!("\n{}/{} passed", passed, checks.len());
    Ok(())
}

/// Handles the main audit run
async fn handle_audit(ctx: AuditContext) -> anyhow::Result<()> {
    let launcher = Arc::new(ChromiumLauncher::from_config(&ctx.config.browser));
    let pool = Arc::new(BrowserPool::new(launcher, PoolConfig::from(&ctx.config.browser)));

    let run = match run_audit(Arc::new(ctx), pool).await {
        Ok(run) => {
            tracing::info!("Audit completed successfully");
            run
        }
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&run.results.summary);
    println!("\nResults: {}", run.results_path.display());
    if let Some(csv) = &run.csv_path {
        println!("Pages CSV: {}", csv.display());
    }
    println!("Summary: {}", run.summary_path.display());
    if let Some(path) = run.patterns.as_ref().and_then(|p| p.output_path.as_ref()) {
        println!("Pattern library: {}", path.display());
    }

    Ok(())
}
