//! DTOs for the redirect endpoint.

use serde::Serialize;

/// Body returned instead of a redirect when a password is needed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequiredResponse {
    pub requires_password: bool,
}
