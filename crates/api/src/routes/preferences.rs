//! Per-user notification preference routes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use sportiq_common::error::AppError;
use sportiq_common::types::{SubscriptionFilter, SubscriptionPreferences};
use sportiq_engine::preferences::SubscriptionStore;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/notifications/preferences",
        get(get_preferences).put(update_preferences),
    )
}

#[derive(Debug, Deserialize)]
struct UpdatePreferencesParams {
    preferences: SubscriptionPreferences,
    #[serde(default)]
    filters: Vec<SubscriptionFilter>,
}

/// GET /api/notifications/preferences — The caller's subscription, created
/// with defaults on first access.
async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let subscription = SubscriptionStore::get_or_create(&state.pool, auth.user_id).await?;
    Ok(Json(json!({ "success": true, "data": subscription })))
}

/// PUT /api/notifications/preferences
async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<UpdatePreferencesParams>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = SubscriptionStore::upsert(
        &state.pool,
        auth.user_id,
        &params.preferences,
        &params.filters,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": subscription,
        "message": "Preferences updated"
    })))
}
