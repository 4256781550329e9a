//! Admin statistics routes.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use sportiq_common::error::AppError;
use sportiq_engine::stats::StatsService;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications/stats/overview", get(overview))
}

#[derive(Debug, Deserialize)]
struct OverviewQuery {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

/// GET /api/notifications/stats/overview — Aggregate counters by
/// type/priority/status, admins only.
async fn overview(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<OverviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.role.is_admin() {
        return Err(AppError::Permission(
            "Only admins can view notification statistics".to_string(),
        ));
    }

    let overview = StatsService::overview(&state.pool, query.start_date, query.end_date).await?;
    Ok(Json(json!({ "success": true, "data": overview })))
}
