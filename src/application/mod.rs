//! Application layer services implementing the redirect path.
//!
//! Services consume repository and store traits and expose a small API to
//! the HTTP handlers and the background worker.
//!
//! # Available Services
//!
//! - [`services::resolver::Resolver`] - Slug resolution, validation and password checks
//! - [`services::fraud_guard::FraudGuard`] - Rate counting and bot classification
//! - [`services::click_recorder::ClickRecorder`] - Enrichment and persistence of accepted clicks

pub mod services;
