//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the system of record. Concrete implementations live
//! in `crate::infrastructure::persistence`; mocks are generated via `mockall`
//! for unit tests, and integration tests provide in-memory fakes.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link reads and atomic counter updates
//! - [`ClickRepository`] - Append-only click log

pub mod click_repository;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
