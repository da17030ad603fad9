//! CLI administration tool for link-redirector.
//!
//! Operator commands that act on the shared stores directly, without going
//! through the HTTP surface.
//!
//! # Usage
//!
//! ```bash
//! # Drop a cached snapshot after editing a link
//! cargo run --bin admin -- cache invalidate promo-2024
//!
//! # Show the most requested slugs
//! cargo run --bin admin -- hot top -n 20
//!
//! # Delete click events past the retention window
//! cargo run --bin admin -- clicks sweep --days 730
//!
//! # View totals
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required for `clicks`, `stats` and `db`)
//! - `REDIS_URL` (required for `cache` and `hot`)

use link_redirector::infrastructure::cache::{CacheService, RedisCache, connect_redis};
use link_redirector::infrastructure::hot_links::{HotLinkTracker, RedisHotLinks};
use link_redirector::infrastructure::maintenance::{MAX_RETENTION_DAYS, sweep_clicks};
use link_redirector::infrastructure::persistence::PgClickRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for operating link-redirector.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage cached link snapshots
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect the hot-link ranking
    Hot {
        #[command(subcommand)]
        action: HotAction,
    },

    /// Click event maintenance
    Clicks {
        #[command(subcommand)]
        action: ClicksAction,
    },

    /// Show link and click totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove the cached snapshot of a slug
    Invalidate {
        /// Slug whose snapshot should be dropped
        slug: String,
    },
}

#[derive(Subcommand)]
enum HotAction {
    /// List the most requested slugs
    Top {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 10)]
        n: usize,
    },
}

#[derive(Subcommand)]
enum ClicksAction {
    /// Delete click events older than the retention window
    Sweep {
        /// Retention window in days
        #[arg(
            short,
            long,
            default_value_t = 730,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RETENTION_DAYS))
        )]
        days: u32,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cache { action } => handle_cache_action(action).await?,
        Commands::Hot { action } => handle_hot_action(action).await?,
        Commands::Clicks { action } => handle_clicks_action(action, &connect_db().await?).await?,
        Commands::Stats => handle_stats(&connect_db().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect_db().await?).await?,
    }

    Ok(())
}

async fn connect_db() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Connects to the shared Redis instance.
///
/// The in-process fallback store lives inside the server process, so these
/// commands only make sense against Redis.
async fn connect_shared_store() -> Result<ConnectionManager> {
    let Ok(redis_url) = std::env::var("REDIS_URL") else {
        println!(
            "{}",
            "⚠️  REDIS_URL is not set: the server keeps its cache in process memory,"
                .yellow()
        );
        println!(
            "{}",
            "   so it cannot be inspected or changed from another process.".yellow()
        );
        anyhow::bail!("REDIS_URL must be set");
    };

    connect_redis(&redis_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))
}

async fn handle_cache_action(action: CacheAction) -> Result<()> {
    let conn = connect_shared_store().await?;

    match action {
        CacheAction::Invalidate { slug } => {
            // TTL is irrelevant for invalidation
            let cache = RedisCache::new(conn, Duration::from_secs(1));

            cache
                .invalidate(&slug)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to invalidate: {}", e))?;

            println!(
                "{} {}",
                "✅ Cache entry dropped:".green().bold(),
                slug.cyan()
            );
        }
    }

    Ok(())
}

/// Prints the hot-link ranking.
///
/// # Output Format
///
/// ```text
/// 🔥 Hot Links
///
///   #    Slug                                     Score
///   ──────────────────────────────────────────────────────
///   1    promo-2024                               1532
/// ```
async fn handle_hot_action(action: HotAction) -> Result<()> {
    let conn = connect_shared_store().await?;

    match action {
        HotAction::Top { n } => {
            // Capacity only matters for writes
            let tracker = RedisHotLinks::new(conn, n.max(1));

            let top = tracker
                .top(n)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read ranking: {}", e))?;

            println!("{}", "🔥 Hot Links".bright_blue().bold());
            println!();

            if top.is_empty() {
                println!("{}", "  No requests recorded yet".yellow());
                return Ok(());
            }

            println!(
                "  {:<4} {:<40} {}",
                "#".bright_white().bold(),
                "Slug".bright_white().bold(),
                "Score".bright_white().bold()
            );
            println!("  {}", "─".repeat(54).bright_black());

            for (rank, entry) in top.iter().enumerate() {
                println!(
                    "  {:<4} {:<40} {}",
                    (rank + 1).to_string().bright_black(),
                    entry.slug.cyan(),
                    entry.score.to_string().bright_green()
                );
            }
            println!();
        }
    }

    Ok(())
}

async fn handle_clicks_action(action: ClicksAction, pool: &PgPool) -> Result<()> {
    match action {
        ClicksAction::Sweep { days, yes } => {
            println!("{}", "🧹 Click Retention Sweep".bright_blue().bold());
            println!();
            println!(
                "  Deleting click events older than {} days",
                days.to_string().bright_yellow().bold()
            );
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Run the sweep?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let repo = PgClickRepository::new(Arc::new(pool.clone()));
            let removed = sweep_clicks(&repo, days)
                .await
                .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

            println!(
                "{} {}",
                "✅ Removed click events:".green().bold(),
                removed.to_string().bright_white().bold()
            );
        }
    }

    Ok(())
}

/// Displays link and click totals.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    let total_clicks: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(click_count), 0)::BIGINT FROM links WHERE deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    let events_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_events")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:        {}",
        total_clicks.to_string().bright_green().bold()
    );
    println!(
        "  Click events:  {}",
        events_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
