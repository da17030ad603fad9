//! Domain layer containing business entities and rules.
//!
//! # Architecture
//!
//! - [`entities`] - Link records, cache snapshots and click events
//! - [`repositories`] - Data access trait definitions
//! - [`validator`] - Pure redirect policy check
//! - [`click_event`] - Request signals and queued click jobs
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. [`crate::application::services::Resolver`] accepts a legitimate hit
//! 2. A [`click_event::ClickJob`] is pushed onto the bounded click queue
//! 3. [`click_worker::run_click_worker`] drains the queue in batches
//! 4. [`crate::application::services::ClickRecorder`] persists the event and
//!    bumps the counter via [`repositories::LinkRepository`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
pub mod validator;
