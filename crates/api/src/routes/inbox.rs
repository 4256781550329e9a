//! Per-recipient routes: the user's own notification feed and read/ack.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_engine::notification::{InboxQuery, NotificationService};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/user/notifications", get(my_notifications))
        .route("/api/notifications/user/unread-count", get(unread_count))
        .route("/api/notifications/user/mark-all-read", post(mark_all_read))
        .route("/api/notifications/{id}/read", post(mark_read))
        .route("/api/notifications/{id}/acknowledge", post(acknowledge))
}

/// GET /api/notifications/user/notifications — The caller's received
/// notifications, paginated, optionally unread-only.
async fn my_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<InboxQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (notifications, pagination) =
        NotificationService::inbox(&state.pool, auth.user_id, &query).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "pagination": pagination
        }
    })))
}

/// GET /api/notifications/user/unread-count
async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let count = NotificationService::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(json!({ "success": true, "data": { "count": count } })))
}

/// POST /api/notifications/user/mark-all-read
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let updated = NotificationService::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "updated": updated },
        "message": "All notifications marked as read"
    })))
}

/// POST /api/notifications/:id/read — Idempotent single mark-as-read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    NotificationService::mark_read(&state.pool, id, auth.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read"
    })))
}

/// POST /api/notifications/:id/acknowledge
async fn acknowledge(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    NotificationService::acknowledge(&state.pool, id, auth.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Notification acknowledged"
    })))
}
