//! Slug resolution on the redirect path.
//!
//! Everything awaited here sits between the client and its redirect, so
//! every external call is time-bounded. Cache, hot-link and fraud-counter
//! failures degrade to "miss" / "legitimate"; only the persistent store read
//! can fail a request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::application::services::FraudGuard;
use crate::domain::click_event::{ClickJob, RequestSignals};
use crate::domain::entities::{LinkSnapshot, RedirectKind};
use crate::domain::repositories::LinkRepository;
use crate::domain::validator::validate;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::hot_links::HotLinkTracker;
use crate::utils::identity::IdentityHasher;
use crate::utils::password::verify_password_blocking;
use crate::utils::slug::validate_slug;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Redirect {
        destination: String,
        kind: RedirectKind,
        cache_hit: bool,
    },
    /// The link is password protected and no password was supplied.
    PasswordRequired,
}

/// Timeouts and redirect policy for [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub cache_ttl: Duration,
    /// Bound on cache and hot-link calls.
    pub cache_timeout: Duration,
    /// Bound on persistent store reads; exceeding it fails the request.
    pub store_timeout: Duration,
    /// Answer every redirect with 307 regardless of expiry policy.
    pub uniform_temporary: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            cache_timeout: Duration::from_millis(50),
            store_timeout: Duration::from_millis(300),
            uniform_temporary: false,
        }
    }
}

/// Turns slugs into redirect decisions.
pub struct Resolver {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    hot_links: Arc<dyn HotLinkTracker>,
    fraud_guard: Arc<FraudGuard>,
    hasher: IdentityHasher,
    click_sender: mpsc::Sender<ClickJob>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        hot_links: Arc<dyn HotLinkTracker>,
        fraud_guard: Arc<FraudGuard>,
        hasher: IdentityHasher,
        click_sender: mpsc::Sender<ClickJob>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            links,
            cache,
            hot_links,
            fraud_guard,
            hasher,
            click_sender,
            options,
        }
    }

    /// Resolves `slug` to a redirect, a password prompt or an error.
    ///
    /// Accepted, legitimate hits are queued for the click recorder with
    /// `try_send`; the recorder is never awaited. A full queue drops the
    /// click, never the redirect.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidSlug`] before any I/O
    /// - [`AppError::NotFound`] when the store has no such slug
    /// - [`AppError::Inactive`], [`AppError::Expired`], [`AppError::MaxClicksReached`]
    /// - [`AppError::IncorrectPassword`] on a password mismatch
    /// - [`AppError::StoreUnavailable`] when a store read exceeds its bound
    /// - [`AppError::Internal`] on store errors
    pub async fn resolve(
        &self,
        slug: &str,
        password: Option<&str>,
        signals: RequestSignals,
    ) -> Result<Resolution, AppError> {
        let result = self.resolve_inner(slug, password, signals).await;

        let outcome = match &result {
            Ok(Resolution::Redirect { .. }) => "redirect",
            Ok(Resolution::PasswordRequired) => "password_required",
            Err(e) => e.code(),
        };
        metrics::counter!("redirect_resolutions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn resolve_inner(
        &self,
        slug: &str,
        password: Option<&str>,
        signals: RequestSignals,
    ) -> Result<Resolution, AppError> {
        validate_slug(slug)?;

        let (snapshot, cache_hit) = self.lookup(slug).await?;
        self.note_access(slug, cache_hit).await;

        if let Some(rejection) = validate(&snapshot, Utc::now()) {
            debug!("Link {} rejected: {:?}", slug, rejection);
            return Err(rejection.into());
        }

        if snapshot.has_password {
            let Some(password) = password else {
                return Ok(Resolution::PasswordRequired);
            };
            self.check_password(slug, password).await?;
        }

        let identity_hash = self.hasher.hash(signals.identity());
        let verdict = self.fraud_guard.assess(slug, &identity_hash, &signals).await;

        if verdict.is_legitimate() {
            self.schedule_click(ClickJob::new(
                slug.to_string(),
                snapshot.id,
                snapshot.owner_id,
                signals,
            ));
        }

        let kind = if self.options.uniform_temporary {
            RedirectKind::Temporary
        } else {
            snapshot.redirect_kind()
        };

        Ok(Resolution::Redirect {
            destination: snapshot.destination,
            kind,
            cache_hit,
        })
    }

    /// Cache-aside fetch of a link snapshot.
    ///
    /// On a miss the store is read and the cache populated; the write is
    /// awaited under the cache timeout and its failure ignored. Lookups do
    /// not touch the hot-link ranking, so previews are not ranked.
    ///
    /// Returns the snapshot and whether it came from the cache.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`], [`AppError::StoreUnavailable`] or
    /// [`AppError::Internal`] from the store read.
    pub async fn lookup(&self, slug: &str) -> Result<(LinkSnapshot, bool), AppError> {
        if let Some(snapshot) = self.cached(slug).await {
            return Ok((snapshot, true));
        }

        let record = tokio::time::timeout(self.options.store_timeout, self.links.find_by_slug(slug))
            .await
            .map_err(|_| {
                warn!("Store read for {} exceeded {:?}", slug, self.options.store_timeout);
                AppError::store_unavailable("Link store did not answer in time")
            })??
            .ok_or(AppError::NotFound)?;

        let snapshot = record.snapshot();
        let timeout = self.options.cache_timeout;

        match tokio::time::timeout(
            timeout,
            self.cache.set(slug, &snapshot, Some(self.options.cache_ttl)),
        )
        .await
        {
            Ok(Err(e)) => warn!("Failed to cache {}: {}", slug, e),
            Err(_) => warn!("Cache write for {} timed out", slug),
            Ok(Ok(())) => {}
        }

        Ok((snapshot, false))
    }

    /// Bumps the hot-link ranking for every resolution of a known slug.
    ///
    /// After a miss the bump is awaited under the cache timeout; on a hit it
    /// runs detached so the cached path never waits on the tracker.
    async fn note_access(&self, slug: &str, cache_hit: bool) {
        let timeout = self.options.cache_timeout;

        if cache_hit {
            let hot_links = self.hot_links.clone();
            let slug = slug.to_string();
            tokio::spawn(async move {
                if !matches!(
                    tokio::time::timeout(timeout, hot_links.bump(&slug)).await,
                    Ok(Ok(()))
                ) {
                    debug!("Hot-link bump skipped for {}", slug);
                }
            });
        } else if !matches!(
            tokio::time::timeout(timeout, self.hot_links.bump(slug)).await,
            Ok(Ok(()))
        ) {
            debug!("Hot-link bump skipped for {}", slug);
        }
    }

    /// Drops the cached snapshot so the next resolution reads the store.
    ///
    /// Called by the owner-facing CRUD hook after a link changes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the cache could not be reached;
    /// the stale entry then lives until its TTL.
    pub async fn invalidate(&self, slug: &str) -> Result<(), AppError> {
        self.cache.invalidate(slug).await.map_err(|e| {
            warn!("Failed to invalidate {}: {}", slug, e);
            AppError::internal(format!("Cache invalidation failed: {}", e))
        })
    }

    pub fn click_queue(&self) -> &mpsc::Sender<ClickJob> {
        &self.click_sender
    }

    async fn cached(&self, slug: &str) -> Option<LinkSnapshot> {
        match tokio::time::timeout(self.options.cache_timeout, self.cache.get(slug)).await {
            Ok(Ok(Some(snapshot))) => {
                metrics::counter!("cache_lookups_total", "result" => "hit").increment(1);
                Some(snapshot)
            }
            Ok(Ok(None)) => {
                metrics::counter!("cache_lookups_total", "result" => "miss").increment(1);
                None
            }
            Ok(Err(e)) => {
                warn!("Cache lookup failed for {}, reading store: {}", slug, e);
                metrics::counter!("cache_lookups_total", "result" => "error").increment(1);
                None
            }
            Err(_) => {
                warn!("Cache lookup for {} timed out, reading store", slug);
                metrics::counter!("cache_lookups_total", "result" => "timeout").increment(1);
                None
            }
        }
    }

    /// Verifies against the store; cached snapshots never carry hashes.
    async fn check_password(&self, slug: &str, password: &str) -> Result<(), AppError> {
        let hash = tokio::time::timeout(
            self.options.store_timeout,
            self.links.find_password_hash(slug),
        )
        .await
        .map_err(|_| AppError::store_unavailable("Link store did not answer in time"))??;

        // The password was removed after the snapshot was cached.
        let Some(hash) = hash else {
            return Ok(());
        };

        if verify_password_blocking(password.to_string(), hash).await? {
            Ok(())
        } else {
            Err(AppError::IncorrectPassword)
        }
    }

    fn schedule_click(&self, job: ClickJob) {
        match self.click_sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                warn!("Click queue full, dropping click on {}", job.slug);
                metrics::counter!("click_jobs_dropped_total").increment(1);
            }
            Err(TrySendError::Closed(job)) => {
                warn!("Click queue closed, dropping click on {}", job.slug);
                metrics::counter!("click_jobs_dropped_total").increment(1);
            }
        }
    }
}
