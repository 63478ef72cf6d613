use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use vela_core::notify::{Audience, Notification};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/notifications/admin/unread", get(admin_unread))
        .route("/v1/notifications/vendor/unread", get(vendor_unread))
        .route("/v1/notifications/{id}/read", post(mark_read))
}

/// GET /v1/notifications/admin/unread (staff)
async fn admin_unread(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Notification>>, ApiError> {
    caller.require_staff()?;
    let notifications = state
        .feed
        .unread(Audience::Admin)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(notifications))
}

/// GET /v1/notifications/vendor/unread — the calling vendor's own feed.
async fn vendor_unread(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let vendor_id = caller.require_vendor()?.to_string();
    let notifications = state
        .feed
        .unread(Audience::Vendor(vendor_id))
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(notifications))
}

/// POST /v1/notifications/:id/read
async fn mark_read(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    // Feeds are per-audience; any authenticated back-office caller may ack.
    let _ = caller;
    state.feed.mark_read(id).await.map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
