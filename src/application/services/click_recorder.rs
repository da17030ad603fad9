//! Background click recording.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use crate::domain::click_event::ClickJob;
use crate::domain::entities::{ClickIncrement, NewClickEvent};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::counters::{CounterStore, unique_visitors_key};
use crate::infrastructure::enrichment::ClickEnricher;
use crate::utils::identity::IdentityHasher;

/// Tunables for [`ClickRecorder`].
#[derive(Debug, Clone)]
pub struct ClickRecorderOptions {
    /// Expiry of a (slug, day) unique-visitor set, refreshed on every add.
    pub unique_visitor_ttl: Duration,
    /// Bound on best-effort cache and counter-store calls.
    pub side_effect_timeout: Duration,
    /// Retries of the atomic counter increment after the first attempt.
    pub increment_retries: usize,
}

impl Default for ClickRecorderOptions {
    fn default() -> Self {
        Self {
            unique_visitor_ttl: Duration::from_secs(48 * 3600),
            side_effect_timeout: Duration::from_millis(50),
            increment_retries: 3,
        }
    }
}

/// Turns accepted clicks into persisted analytics.
///
/// Only the atomic counter increment is critical; enrichment, the unique
/// visitor set, the event append and the cache bump swallow their own
/// errors. The recorder runs on the click worker and is never awaited by a
/// request handler.
pub struct ClickRecorder {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
    cache: Arc<dyn CacheService>,
    counters: Arc<dyn CounterStore>,
    enricher: Arc<dyn ClickEnricher>,
    hasher: IdentityHasher,
    options: ClickRecorderOptions,
}

impl ClickRecorder {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        cache: Arc<dyn CacheService>,
        counters: Arc<dyn CounterStore>,
        enricher: Arc<dyn ClickEnricher>,
        hasher: IdentityHasher,
        options: ClickRecorderOptions,
    ) -> Self {
        Self {
            links,
            clicks,
            cache,
            counters,
            enricher,
            hasher,
            options,
        }
    }

    /// Records one click.
    ///
    /// # Errors
    ///
    /// Returns the last [`AppError`] of the counter increment once all
    /// retries are exhausted. Every other failure is logged and absorbed.
    pub async fn record(&self, job: ClickJob) -> Result<(), AppError> {
        let event = self.prepare(&job).await;

        if let Err(e) = self.clicks.append(event).await {
            warn!("Failed to append click event for {}: {}", job.slug, e);
        }

        self.increment_with_retry(job.link_id, job.occurred_at)
            .await
            .inspect_err(|e| error!("Click counter update failed for {}: {}", job.slug, e))?;

        self.bump_cache(&job.slug, 1).await;
        metrics::counter!("click_events_recorded_total").increment(1);
        debug!("Recorded click on {}", job.slug);

        Ok(())
    }

    /// Records buffered clicks with one bulk append and one bulk increment.
    ///
    /// # Errors
    ///
    /// Returns the bulk increment error; the appended events are kept.
    pub async fn record_batch(&self, jobs: Vec<ClickJob>) -> Result<(), AppError> {
        if jobs.is_empty() {
            return Ok(());
        }

        let mut events = Vec::with_capacity(jobs.len());
        for job in &jobs {
            events.push(self.prepare(job).await);
        }

        let recorded = events.len() as u64;
        if let Err(e) = self.clicks.append_batch(events).await {
            warn!("Failed to append {} click events: {}", recorded, e);
        }

        let increments = aggregate_increments(&jobs);
        let links = self.links.clone();
        Retry::spawn(self.retry_strategy(), || {
            let links = links.clone();
            let increments = increments.clone();
            async move { links.increment_clicks_bulk(increments).await }
        })
        .await
        .inspect_err(|e| error!("Bulk click counter update failed: {}", e))?;

        let mut per_slug: HashMap<&str, i64> = HashMap::new();
        for job in &jobs {
            *per_slug.entry(job.slug.as_str()).or_default() += 1;
        }
        for (slug, count) in per_slug {
            self.bump_cache(slug, count).await;
        }

        metrics::counter!("click_events_recorded_total").increment(recorded);
        debug!("Recorded batch of {} clicks", recorded);

        Ok(())
    }

    /// Size of today's unique-visitor set for `slug`.
    ///
    /// Returns `None` when the counter store is unavailable.
    pub async fn unique_visitors_today(&self, slug: &str) -> Option<u64> {
        let key = unique_visitors_key(slug, &day_bucket(Utc::now()));

        match tokio::time::timeout(self.options.side_effect_timeout, self.counters.set_size(&key))
            .await
        {
            Ok(Ok(size)) => Some(size),
            Ok(Err(e)) => {
                warn!("Unique visitor lookup failed for {}: {}", slug, e);
                None
            }
            Err(_) => None,
        }
    }

    /// Enriches, hashes and stamps uniqueness for one job.
    ///
    /// Geolocation sees the raw address; everything stored sees the hash.
    async fn prepare(&self, job: &ClickJob) -> NewClickEvent {
        let enrichment = self.enricher.enrich(&job.signals).await;
        let identity_hash = self.hasher.hash(job.signals.identity());
        let is_unique = self
            .mark_visitor(&job.slug, &identity_hash, job.occurred_at)
            .await;

        NewClickEvent {
            link_id: job.link_id,
            clicked_at: job.occurred_at,
            identity_hash: Some(identity_hash),
            device: enrichment.device,
            browser: enrichment.browser,
            os: enrichment.os,
            country: enrichment.geo.country,
            city: enrichment.geo.city,
            referrer: enrichment.referrer,
            referrer_host: enrichment.referrer_host,
            utm_source: enrichment.campaign.source,
            utm_medium: enrichment.campaign.medium,
            utm_campaign: enrichment.campaign.campaign,
            utm_term: enrichment.campaign.term,
            utm_content: enrichment.campaign.content,
            is_unique,
        }
    }

    /// Adds the visitor to the slug's set for the click's UTC day.
    ///
    /// Counts as unique when the store is unreachable, so an outage inflates
    /// uniques rather than hiding visitors.
    async fn mark_visitor(&self, slug: &str, identity_hash: &str, at: DateTime<Utc>) -> bool {
        let key = unique_visitors_key(slug, &day_bucket(at));
        match tokio::time::timeout(
            self.options.side_effect_timeout,
            self.counters.add_to_set(&key, identity_hash, self.options.unique_visitor_ttl),
        )
        .await
        {
            Ok(Ok(added)) => added,
            Ok(Err(e)) => {
                warn!("Unique visitor tracking failed for {}: {}", slug, e);
                true
            }
            Err(_) => true,
        }
    }

    async fn increment_with_retry(&self, link_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let links = self.links.clone();
        Retry::spawn(self.retry_strategy(), || {
            let links = links.clone();
            async move { links.increment_clicks(link_id, at).await }
        })
        .await
    }

    async fn bump_cache(&self, slug: &str, by: i64) {
        match tokio::time::timeout(
            self.options.side_effect_timeout,
            self.cache.bump_cached_count(slug, by),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Cached count bump skipped for {}: {}", slug, e),
            Err(_) => debug!("Cached count bump timed out for {}", slug),
        }
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_millis(500))
            .map(jitter)
            .take(self.options.increment_retries)
    }
}

/// `YYYYMMDD` bucket for unique-visitor keys.
fn day_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

/// Collapses jobs into one delta per link, keeping the latest click time.
fn aggregate_increments(jobs: &[ClickJob]) -> Vec<ClickIncrement> {
    let mut by_link: HashMap<i64, ClickIncrement> = HashMap::new();

    for job in jobs {
        by_link
            .entry(job.link_id)
            .and_modify(|inc| {
                inc.count += 1;
                inc.last_clicked_at = inc.last_clicked_at.max(job.occurred_at);
            })
            .or_insert(ClickIncrement {
                link_id: job.link_id,
                count: 1,
                last_clicked_at: job.occurred_at,
            });
    }

    let mut increments: Vec<ClickIncrement> = by_link.into_values().collect();
    increments.sort_by_key(|inc| inc.link_id);
    increments
}
