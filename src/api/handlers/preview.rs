//! Handler for link previews.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::preview::LinkPreviewResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::slug::validate_slug;

/// Returns public metadata for a slug without following or counting it.
///
/// # Endpoint
///
/// `GET /links/preview/{slug}`
///
/// Uses the same cache-aside lookup as the redirect, so previews warm the
/// cache. Policy checks are not applied: an expired link still previews.
///
/// # Errors
///
/// Returns 400 for an invalid slug, 404 for an unknown one, 503 when the
/// store does not answer in time.
pub async fn preview_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkPreviewResponse>, AppError> {
    validate_slug(&slug)?;

    let (snapshot, _) = state.resolver.lookup(&slug).await?;
    let unique_visitors_today = state.recorder.unique_visitors_today(&slug).await;
    let redirect_kind = snapshot.redirect_kind();

    Ok(Json(LinkPreviewResponse {
        destination: (!snapshot.has_password).then_some(snapshot.destination),
        slug: snapshot.slug,
        title: snapshot.title,
        description: snapshot.description,
        requires_password: snapshot.has_password,
        redirect_kind,
        expires_at: snapshot.expires_at,
        click_count: snapshot.click_count,
        max_clicks: snapshot.max_clicks,
        unique_visitors_today,
    }))
}
