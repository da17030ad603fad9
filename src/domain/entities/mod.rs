//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A short link as persisted by the system of record
//! - [`LinkSnapshot`] - The cacheable, password-free subset of a link
//! - [`ClickEvent`] - An accepted, immutable click
//!
//! Creation inputs follow the `New*` convention ([`NewClickEvent`]).

pub mod click;
pub mod link;

pub use click::{ClickEvent, ClickIncrement, NewClickEvent};
pub use link::{LinkRecord, LinkSnapshot, RedirectKind};
