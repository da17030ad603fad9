//! Request-context enrichment for click analytics.
//!
//! The redirect engine only depends on the [`ClickEnricher`] and
//! [`GeoLookup`] traits; [`HeaderEnricher`] and [`NullGeoLookup`] are the
//! built-in defaults.

mod enricher;
mod geo;

pub use enricher::{CampaignTags, ClickEnricher, Enrichment, HeaderEnricher, parse_campaign};
pub use geo::{GeoInfo, GeoLookup, NullGeoLookup};
