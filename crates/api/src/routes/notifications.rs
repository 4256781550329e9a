//! Notification CRUD and dispatch routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{NotificationStatus, Role};
use sportiq_engine::notification::{
    BatchParams, CreateNotificationParams, ListQuery, NotificationService,
    UpdateNotificationParams,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route("/api/notifications/batch", post(batch_operations))
        .route(
            "/api/notifications/{id}",
            get(get_notification)
                .put(update_notification)
                .delete(delete_notification),
        )
        .route("/api/notifications/{id}/send", post(send_notification))
}

/// POST /api/notifications — Create a notification; immediate dispatch when
/// no future send time was requested.
async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<CreateNotificationParams>,
) -> Result<impl IntoResponse, AppError> {
    if auth.role == Role::Student {
        return Err(AppError::Permission(
            "Students cannot create notifications".to_string(),
        ));
    }

    let actor = auth.actor();
    let notification =
        NotificationService::create(&state.pool, state.directory.as_ref(), &params, &actor)
            .await?;

    let notification = if notification.status == NotificationStatus::Draft
        && notification.send_at.is_none_or(|t| t <= Utc::now())
    {
        state.orchestrator.dispatch(notification.id).await?;
        NotificationService::get(&state.pool, notification.id).await?
    } else {
        notification
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": notification,
            "message": "Notification created"
        })),
    ))
}

/// GET /api/notifications — List notifications, scoped by the caller's role.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let actor = auth.actor();
    let (notifications, pagination) =
        NotificationService::list(&state.pool, &query, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "pagination": pagination
        }
    })))
}

/// GET /api/notifications/:id — Full detail for the creator, a recipient,
/// or an admin.
async fn get_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = NotificationService::get_detail(&state.pool, id).await?;

    let can_access = auth.role.is_admin()
        || detail.notification.created_by == auth.user_id
        || detail
            .recipients
            .iter()
            .any(|r| r.recipient.user_id == auth.user_id);

    if !can_access {
        return Err(AppError::Permission(
            "Not authorized to view this notification".to_string(),
        ));
    }

    Ok(Json(json!({ "success": true, "data": detail })))
}

/// PUT /api/notifications/:id — Update; content edits are rejected once the
/// notification has been sent.
async fn update_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateNotificationParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = auth.actor();
    let notification = NotificationService::update(&state.pool, id, &params, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "data": notification,
        "message": "Notification updated"
    })))
}

/// DELETE /api/notifications/:id
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = auth.actor();
    NotificationService::delete(&state.pool, id, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification deleted"
    })))
}

/// POST /api/notifications/:id/send — Trigger dispatch. Channel-level
/// delivery failures surface only through the model, never as an error here.
async fn send_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notification = NotificationService::get(&state.pool, id).await?;
    if !auth.role.is_admin() && notification.created_by != auth.user_id {
        return Err(AppError::Permission(
            "Not authorized to send this notification".to_string(),
        ));
    }

    let summary = state.orchestrator.dispatch(id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "attempted": summary.attempted,
            "delivered": summary.delivered,
            "failed": summary.failed,
            "filtered": summary.filtered,
            "status": summary.status
        },
        "message": "Notification dispatched"
    })))
}

/// POST /api/notifications/batch — Bulk delete/cancel, admins only.
async fn batch_operations(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<BatchParams>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.role.is_admin() {
        return Err(AppError::Permission(
            "Only admins can run batch operations".to_string(),
        ));
    }

    let affected = NotificationService::batch(&state.pool, &params).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "affected": affected }
    })))
}
