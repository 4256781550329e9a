//! Notification template routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use sportiq_common::error::AppError;
use sportiq_engine::template::{CreateTemplateParams, TemplateListQuery, TemplateService};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/templates/list", get(list_templates))
        .route("/api/notifications/templates", post(create_template))
}

/// GET /api/notifications/templates/list
async fn list_templates(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<TemplateListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let templates = TemplateService::list(&state.pool, &query).await?;
    Ok(Json(json!({ "success": true, "data": templates })))
}

/// POST /api/notifications/templates — Admins only.
async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<CreateTemplateParams>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.role.is_admin() {
        return Err(AppError::Permission(
            "Only admins can create notification templates".to_string(),
        ));
    }

    let template = TemplateService::create(&state.pool, &params, auth.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": template,
            "message": "Template created"
        })),
    ))
}
