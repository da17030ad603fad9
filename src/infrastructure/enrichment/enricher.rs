//! Click enrichment: device, browser, OS, referrer, campaign tags, geography.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;
use woothee::parser::Parser;

use super::geo::{GeoInfo, GeoLookup};
use crate::domain::click_event::RequestSignals;

/// Analytics attributes derived from request signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub is_crawler: bool,
    pub geo: GeoInfo,
    pub referrer: Option<String>,
    pub referrer_host: Option<String>,
    pub campaign: CampaignTags,
}

/// `utm_*` parameters found on the redirect request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignTags {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

/// Turns raw request signals into analytics attributes.
///
/// Must be given the unhashed client address: geolocation happens here,
/// before the identity is hashed for storage.
#[async_trait]
pub trait ClickEnricher: Send + Sync {
    async fn enrich(&self, signals: &RequestSignals) -> Enrichment;
}

/// Default enricher: woothee for the user agent, `url` for referrer and
/// query parsing, plus a pluggable [`GeoLookup`].
pub struct HeaderEnricher {
    geo: Arc<dyn GeoLookup>,
}

impl HeaderEnricher {
    pub fn new(geo: Arc<dyn GeoLookup>) -> Self {
        Self { geo }
    }
}

#[async_trait]
impl ClickEnricher for HeaderEnricher {
    async fn enrich(&self, signals: &RequestSignals) -> Enrichment {
        let mut enrichment = Enrichment::default();

        if let Some(ua) = signals.user_agent.as_deref() {
            apply_user_agent(&mut enrichment, ua);
        }

        if let Some(referrer) = signals.referer.as_deref() {
            enrichment.referrer = Some(referrer.to_string());
            enrichment.referrer_host = Url::parse(referrer)
                .ok()
                .and_then(|url| url.host_str().map(str::to_lowercase));
        }

        if let Some(query) = signals.query.as_deref() {
            enrichment.campaign = parse_campaign(query);
        }

        let looked_up = match signals.ip.as_deref() {
            Some(ip) => self.geo.lookup(ip).await,
            None => None,
        };
        enrichment.geo = looked_up.unwrap_or_else(|| GeoInfo {
            country: signals.country_hint.as_ref().map(|c| c.to_uppercase()),
            city: None,
        });

        enrichment
    }
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

fn apply_user_agent(enrichment: &mut Enrichment, ua: &str) {
    let Some(result) = Parser::new().parse(ua) else {
        return;
    };

    enrichment.device = known(result.category);
    enrichment.browser = known(result.name);
    enrichment.os = known(result.os);
    enrichment.is_crawler = result.category == "crawler";
}

/// Extracts `utm_*` tags from a raw query string.
pub fn parse_campaign(query: &str) -> CampaignTags {
    let mut tags = CampaignTags::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        let slot = match &*key {
            "utm_source" => &mut tags.source,
            "utm_medium" => &mut tags.medium,
            "utm_campaign" => &mut tags.campaign,
            "utm_term" => &mut tags.term,
            "utm_content" => &mut tags.content,
            _ => continue,
        };
        *slot = Some(value.into_owned());
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::enrichment::NullGeoLookup;

    struct FixedGeo;

    #[async_trait]
    impl GeoLookup for FixedGeo {
        async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
            (ip == "203.0.113.7").then(|| GeoInfo {
                country: Some("NL".to_string()),
                city: Some("Amsterdam".to_string()),
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[tokio::test]
    async fn test_enrich_browser_and_referrer() {
        let enricher = HeaderEnricher::new(Arc::new(NullGeoLookup));
        let signals = RequestSignals {
            user_agent: Some(CHROME.to_string()),
            referer: Some("https://News.Example.org/article?id=1".to_string()),
            ..Default::default()
        };

        let enrichment = enricher.enrich(&signals).await;

        assert_eq!(enrichment.browser.as_deref(), Some("Chrome"));
        assert_eq!(enrichment.device.as_deref(), Some("pc"));
        assert!(!enrichment.is_crawler);
        assert_eq!(enrichment.referrer_host.as_deref(), Some("news.example.org"));
    }

    #[tokio::test]
    async fn test_enrich_detects_crawler() {
        let enricher = HeaderEnricher::new(Arc::new(NullGeoLookup));
        let signals = RequestSignals {
            user_agent: Some(
                "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
                    .to_string(),
            ),
            ..Default::default()
        };

        assert!(enricher.enrich(&signals).await.is_crawler);
    }

    #[tokio::test]
    async fn test_geo_uses_raw_address_then_hint() {
        let enricher = HeaderEnricher::new(Arc::new(FixedGeo));

        let located = enricher
            .enrich(&RequestSignals {
                ip: Some("203.0.113.7".to_string()),
                country_hint: Some("de".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(located.geo.city.as_deref(), Some("Amsterdam"));

        let hinted = enricher
            .enrich(&RequestSignals {
                ip: Some("198.51.100.1".to_string()),
                country_hint: Some("de".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(hinted.geo.country.as_deref(), Some("DE"));
    }

    #[test]
    fn test_parse_campaign() {
        let tags = parse_campaign("pwd=x&utm_source=newsletter&utm_medium=email&utm_campaign=spring%20sale&utm_term=");

        assert_eq!(tags.source.as_deref(), Some("newsletter"));
        assert_eq!(tags.medium.as_deref(), Some("email"));
        assert_eq!(tags.campaign.as_deref(), Some("spring sale"));
        assert!(tags.term.is_none());
        assert!(tags.content.is_none());
    }
}
