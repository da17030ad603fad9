//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, store selection, worker spawning, and Axum
//! server lifecycle.

use crate::application::services::{
    ClickRecorder, ClickRecorderOptions, FraudGuard, FraudGuardOptions, Resolver, ResolverOptions,
};
use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache, connect_redis};
use crate::infrastructure::counters::{CounterStore, MemoryCounters, RedisCounters};
use crate::infrastructure::enrichment::{HeaderEnricher, NullGeoLookup};
use crate::infrastructure::hot_links::{HotLinkTracker, MemoryHotLinks, RedisHotLinks};
use crate::infrastructure::maintenance::spawn_retention_sweeper;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::identity::IdentityHasher;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Shards of the in-process store when Redis is not available.
const MEMORY_STORE_SHARDS: usize = 16;

/// How long shutdown waits for queued clicks to be recorded.
const CLICK_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache, counter and hot-link backends sharing one connection or store.
struct Stores {
    cache: Arc<dyn CacheService>,
    counters: Arc<dyn CounterStore>,
    hot_links: Arc<dyn HotLinkTracker>,
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis stores (or the in-process actor store fallback)
/// - Background click worker and retention sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let stores = build_stores(&config).await;

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository: Arc<dyn ClickRepository> =
        Arc::new(PgClickRepository::new(pool.clone()));
    let hasher = IdentityHasher::new(config.identity_hash_secret.clone());

    let recorder = Arc::new(ClickRecorder::new(
        link_repository.clone(),
        click_repository.clone(),
        stores.cache.clone(),
        stores.counters.clone(),
        Arc::new(HeaderEnricher::new(Arc::new(NullGeoLookup))),
        hasher.clone(),
        ClickRecorderOptions {
            unique_visitor_ttl: Duration::from_secs(config.unique_visitor_grace_seconds),
            side_effect_timeout: config.cache_timeout(),
            ..Default::default()
        },
    ));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        recorder.clone(),
        config.click_batch_size,
        config.click_worker_concurrency,
    ));
    tracing::info!("Click worker started");

    let sweeper = spawn_retention_sweeper(
        click_repository,
        config.click_retention_days,
        Duration::from_secs(config.retention_sweep_interval_seconds),
    );

    let fraud_guard = Arc::new(FraudGuard::new(
        stores.counters.clone(),
        FraudGuardOptions {
            threshold: config.fraud_threshold,
            window: Duration::from_secs(config.fraud_window_seconds),
            timeout: config.cache_timeout(),
        },
    ));

    let resolver = Arc::new(Resolver::new(
        link_repository.clone(),
        stores.cache.clone(),
        stores.hot_links.clone(),
        fraud_guard,
        hasher,
        click_tx,
        ResolverOptions {
            cache_ttl: config.cache_ttl(),
            cache_timeout: config.cache_timeout(),
            store_timeout: config.store_timeout(),
            uniform_temporary: config.uniform_temporary_redirects,
        },
    ));

    let state = AppState::new(
        resolver,
        recorder,
        stores.cache,
        stores.hot_links,
        link_repository,
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last click sender; the worker drains and exits.
    sweeper.abort();
    match tokio::time::timeout(CLICK_DRAIN_TIMEOUT, worker).await {
        Ok(_) => tracing::info!("Click queue drained"),
        Err(_) => tracing::warn!("Click queue not drained within {:?}", CLICK_DRAIN_TIMEOUT),
    }

    Ok(())
}

/// Picks Redis when configured and reachable, otherwise the in-process store.
async fn build_stores(config: &Config) -> Stores {
    if let Some(redis_url) = &config.redis_url {
        match connect_redis(redis_url).await {
            Ok(manager) => {
                tracing::info!("Shared store enabled (Redis)");
                return Stores {
                    cache: Arc::new(RedisCache::new(manager.clone(), config.cache_ttl())),
                    counters: Arc::new(RedisCounters::new(manager.clone())),
                    hot_links: Arc::new(RedisHotLinks::new(manager, config.hot_links_capacity)),
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Using in-process store.",
                    e
                );
            }
        }
    } else {
        tracing::info!("Redis not configured, using in-process store");
    }

    let store = MemoryStore::spawn(MEMORY_STORE_SHARDS);
    Stores {
        cache: Arc::new(MemoryCache::new(store.clone(), config.cache_ttl())),
        counters: Arc::new(MemoryCounters::new(store)),
        hot_links: Arc::new(MemoryHotLinks::spawn(config.hot_links_capacity)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
