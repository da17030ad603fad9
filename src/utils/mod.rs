//! Utility functions for slug checks, hashing and request handling.
//!
//! - [`slug`] - Slug syntax validation
//! - [`identity`] - Keyed hashing of client identities
//! - [`password`] - Argon2 password verification
//! - [`request_signals`] - Client signal extraction from HTTP headers

pub mod identity;
pub mod password;
pub mod request_signals;
pub mod slug;
