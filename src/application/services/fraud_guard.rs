//! Click-fraud screening.
//!
//! The guard never blocks traffic: every verdict still redirects. It only
//! decides whether a hit is counted in analytics.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::click_event::RequestSignals;
use crate::infrastructure::counters::{CounterStore, rate_window_key};

/// Crawlers that are allowed through but kept out of human metrics.
const TRUSTED_CRAWLERS: &[&str] = &[
    "googlebot",
    "bingbot",
    "duckduckbot",
    "yandexbot",
    "baiduspider",
    "applebot",
    "slurp",
    "facebookexternalhit",
    "twitterbot",
    "linkedinbot",
    "slackbot",
    "telegrambot",
    "discordbot",
    "whatsapp",
];

/// Automation markers woothee does not always classify as crawlers.
const BOT_MARKERS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "headless",
    "curl/",
    "wget/",
    "python-requests",
    "go-http-client",
    "okhttp",
    "httpclient",
];

/// Outcome of screening one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudVerdict {
    Legitimate,
    TrustedCrawler,
    Bot,
    /// Neither `Accept` nor `Accept-Language` was sent.
    MissingBrowserSignals,
    RateExceeded,
}

impl FraudVerdict {
    pub fn is_legitimate(self) -> bool {
        matches!(self, Self::Legitimate)
    }

    /// Label used for the `fraud_exclusions_total` counter.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Legitimate => "none",
            Self::TrustedCrawler => "trusted_crawler",
            Self::Bot => "bot",
            Self::MissingBrowserSignals => "missing_browser_signals",
            Self::RateExceeded => "rate_exceeded",
        }
    }
}

/// Tunables for [`FraudGuard`].
#[derive(Debug, Clone)]
pub struct FraudGuardOptions {
    /// Hits per window per (slug, identity) that still count.
    pub threshold: u64,
    /// Length of the sliding window hits are counted over.
    pub window: Duration,
    /// Bound on the counter-store round trip.
    pub timeout: Duration,
}

impl Default for FraudGuardOptions {
    fn default() -> Self {
        Self {
            threshold: 10,
            window: Duration::from_secs(60),
            timeout: Duration::from_millis(50),
        }
    }
}

/// Per-(slug, identity) rate counter plus user-agent classification.
///
/// Fails open: a counter store that errors or exceeds its timeout yields
/// [`FraudVerdict::Legitimate`].
pub struct FraudGuard {
    counters: Arc<dyn CounterStore>,
    options: FraudGuardOptions,
}

impl FraudGuard {
    pub fn new(counters: Arc<dyn CounterStore>, options: FraudGuardOptions) -> Self {
        Self { counters, options }
    }

    /// Screens a hit on `slug` from the client identified by `identity_hash`.
    ///
    /// Classification runs first and short-circuits, so crawler traffic never
    /// consumes a rate window.
    pub async fn assess(
        &self,
        slug: &str,
        identity_hash: &str,
        signals: &RequestSignals,
    ) -> FraudVerdict {
        let verdict = match classify(signals) {
            FraudVerdict::Legitimate => self.check_rate(slug, identity_hash).await,
            verdict => verdict,
        };

        if !verdict.is_legitimate() {
            debug!("Excluding hit on {} from analytics: {}", slug, verdict.reason());
            metrics::counter!("fraud_exclusions_total", "reason" => verdict.reason()).increment(1);
        }

        verdict
    }

    async fn check_rate(&self, slug: &str, identity_hash: &str) -> FraudVerdict {
        let key = rate_window_key(slug, identity_hash);

        match tokio::time::timeout(
            self.options.timeout,
            self.counters.record_hit(&key, self.options.window),
        )
        .await
        {
            Ok(Ok(count)) if count > self.options.threshold => FraudVerdict::RateExceeded,
            Ok(Ok(_)) => FraudVerdict::Legitimate,
            Ok(Err(e)) => {
                warn!("Fraud counter unavailable, failing open: {}", e);
                FraudVerdict::Legitimate
            }
            Err(_) => {
                warn!(
                    "Fraud counter timed out after {:?}, failing open",
                    self.options.timeout
                );
                FraudVerdict::Legitimate
            }
        }
    }
}

/// User-agent and header classification, no I/O.
pub fn classify(signals: &RequestSignals) -> FraudVerdict {
    if let Some(ua) = signals.user_agent.as_deref() {
        let lowered = ua.to_ascii_lowercase();

        if TRUSTED_CRAWLERS.iter().any(|name| lowered.contains(name)) {
            return FraudVerdict::TrustedCrawler;
        }

        let woothee_crawler = woothee::parser::Parser::new()
            .parse(ua)
            .is_some_and(|result| result.category == "crawler");

        if woothee_crawler || BOT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            return FraudVerdict::Bot;
        }
    }

    if signals.accept.is_none() && signals.accept_language.is_none() {
        return FraudVerdict::MissingBrowserSignals;
    }

    FraudVerdict::Legitimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::CacheError;
    use crate::infrastructure::counters::MockCounterStore;

    const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    fn browser() -> RequestSignals {
        RequestSignals {
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some(CHROME.to_string()),
            accept: Some("text/html".to_string()),
            accept_language: Some("en-US".to_string()),
            ..Default::default()
        }
    }

    fn guard(counters: MockCounterStore) -> FraudGuard {
        FraudGuard::new(Arc::new(counters), FraudGuardOptions::default())
    }

    #[test]
    fn test_classify_browser() {
        assert_eq!(classify(&browser()), FraudVerdict::Legitimate);
    }

    #[test]
    fn test_classify_trusted_crawler() {
        let signals = RequestSignals {
            user_agent: Some(
                "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
                    .to_string(),
            ),
            ..Default::default()
        };
        assert_eq!(classify(&signals), FraudVerdict::TrustedCrawler);
    }

    #[test]
    fn test_classify_scripted_client() {
        let signals = RequestSignals {
            user_agent: Some("curl/8.4.0".to_string()),
            accept: Some("*/*".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&signals), FraudVerdict::Bot);
    }

    #[test]
    fn test_classify_missing_browser_signals() {
        let signals = RequestSignals {
            user_agent: Some(CHROME.to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&signals), FraudVerdict::MissingBrowserSignals);
    }

    #[test]
    fn test_one_signal_is_enough() {
        let signals = RequestSignals {
            user_agent: Some(CHROME.to_string()),
            accept_language: Some("de".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&signals), FraudVerdict::Legitimate);
    }

    #[tokio::test]
    async fn test_under_threshold_is_legitimate() {
        let mut counters = MockCounterStore::new();
        counters
            .expect_record_hit()
            .withf(|key, ttl| key == "rl:promo:abc" && *ttl == Duration::from_secs(60))
            .returning(|_, _| Ok(10));

        let verdict = guard(counters).assess("promo", "abc", &browser()).await;
        assert_eq!(verdict, FraudVerdict::Legitimate);
    }

    #[tokio::test]
    async fn test_over_threshold_is_excluded() {
        let mut counters = MockCounterStore::new();
        counters.expect_record_hit().returning(|_, _| Ok(11));

        let verdict = guard(counters).assess("promo", "abc", &browser()).await;
        assert_eq!(verdict, FraudVerdict::RateExceeded);
    }

    #[tokio::test]
    async fn test_counter_error_fails_open() {
        let mut counters = MockCounterStore::new();
        counters
            .expect_record_hit()
            .returning(|_, _| Err(CacheError::ConnectionError("refused".to_string())));

        let verdict = guard(counters).assess("promo", "abc", &browser()).await;
        assert!(verdict.is_legitimate());
    }

    #[tokio::test]
    async fn test_crawler_does_not_touch_counter() {
        let mut counters = MockCounterStore::new();
        counters.expect_record_hit().never();

        let signals = RequestSignals {
            user_agent: Some("Mozilla/5.0 (compatible; bingbot/2.0)".to_string()),
            ..Default::default()
        };
        let verdict = guard(counters).assess("promo", "abc", &signals).await;
        assert_eq!(verdict, FraudVerdict::TrustedCrawler);
    }

    struct SlowCounters;

    #[async_trait::async_trait]
    impl CounterStore for SlowCounters {
        async fn record_hit(&self, _key: &str, _ttl: Duration) -> crate::infrastructure::cache::CacheResult<u64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(100)
        }

        async fn add_to_set(
            &self,
            _key: &str,
            _member: &str,
            _ttl: Duration,
        ) -> crate::infrastructure::cache::CacheResult<bool> {
            Ok(true)
        }

        async fn set_size(&self, _key: &str) -> crate::infrastructure::cache::CacheResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_timeout_fails_open() {
        let guard = FraudGuard::new(Arc::new(SlowCounters), FraudGuardOptions::default());

        let verdict = guard.assess("promo", "abc", &browser()).await;
        assert!(verdict.is_legitimate());
    }
}
