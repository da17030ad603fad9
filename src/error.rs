//! Error taxonomy surfaced by the redirect path.
//!
//! Business/policy errors carry stable machine-readable codes. Infrastructure
//! failures of non-critical subsystems (cache, fraud counters, hot-link store)
//! never reach this type: callers absorb them as fail-open degradations.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::validator::Rejection;

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Errors returned by the resolver and HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid slug: {slug}")]
    InvalidSlug { slug: String },

    #[error("Short link not found")]
    NotFound,

    #[error("Short link is inactive")]
    Inactive,

    #[error("Short link has expired")]
    Expired,

    #[error("Short link reached its click limit")]
    MaxClicksReached,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("{message}")]
    BadRequest { message: String },

    /// Persistent-store read exceeded its time bound; the client may retry.
    #[error("{message}")]
    StoreUnavailable { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code included in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSlug { .. } => "INVALID_SLUG",
            Self::NotFound => "LINK_NOT_FOUND",
            Self::Inactive => "LINK_INACTIVE",
            Self::Expired => "LINK_EXPIRED",
            Self::MaxClicksReached => "MAX_CLICKS_REACHED",
            Self::IncorrectPassword => "INCORRECT_PASSWORD",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSlug { .. } | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Inactive | Self::Expired | Self::MaxClicksReached => StatusCode::GONE,
            Self::IncorrectPassword => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Inactive => Self::Inactive,
            Rejection::Expired => Self::Expired,
            Rejection::MaxClicksReached => Self::MaxClicksReached,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        Self::bad_request(format!("Invalid parameters: {}", fields.join(", ")))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", e);
        Self::internal("Database error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = matches!(self, Self::StoreUnavailable { .. });

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        if retryable {
            headers.insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors_map_to_gone() {
        assert_eq!(AppError::Inactive.status(), StatusCode::GONE);
        assert_eq!(AppError::Expired.status(), StatusCode::GONE);
        assert_eq!(AppError::MaxClicksReached.status(), StatusCode::GONE);
    }

    #[test]
    fn test_stable_codes() {
        assert_eq!(AppError::NotFound.code(), "LINK_NOT_FOUND");
        assert_eq!(AppError::Inactive.code(), "LINK_INACTIVE");
        assert_eq!(AppError::Expired.code(), "LINK_EXPIRED");
        assert_eq!(AppError::MaxClicksReached.code(), "MAX_CLICKS_REACHED");
        assert_eq!(AppError::IncorrectPassword.code(), "INCORRECT_PASSWORD");
        assert_eq!(
            AppError::InvalidSlug {
                slug: "a b".to_string()
            }
            .code(),
            "INVALID_SLUG"
        );
    }

    #[test]
    fn test_rejection_conversion() {
        assert!(matches!(
            AppError::from(Rejection::MaxClicksReached),
            AppError::MaxClicksReached
        ));
        assert!(matches!(
            AppError::from(Rejection::Expired),
            AppError::Expired
        ));
    }

    #[test]
    fn test_store_unavailable_is_retryable() {
        let response = AppError::store_unavailable("timed out").into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_incorrect_password_is_unauthorized() {
        let response = AppError::IncorrectPassword.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
