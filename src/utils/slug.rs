//! Slug syntax rules.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::AppError;

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 64;

/// ASCII letters, digits, `-` and `_`; must start with a letter or digit.
static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("valid slug regex"));

/// Slugs that collide with service routes.
const RESERVED_SLUGS: &[&str] = &["health", "links", "redirect"];

/// Rejects syntactically invalid slugs before any I/O happens.
///
/// # Errors
///
/// Returns [`AppError::InvalidSlug`] if the slug is empty, longer than
/// [`MAX_SLUG_LENGTH`], contains characters outside `[A-Za-z0-9_-]`, starts
/// with a separator, or is reserved.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_slug("promo-2024").is_ok());
/// assert!(validate_slug("-promo").is_err());
/// ```
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if !SLUG_REGEX.is_match(slug) || RESERVED_SLUGS.contains(&slug) {
        return Err(AppError::InvalidSlug {
            slug: slug.chars().take(MAX_SLUG_LENGTH).collect(),
        });
    }

    Ok(())
}
