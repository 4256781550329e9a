pub mod health;
pub mod inbox;
pub mod notifications;
pub mod preferences;
pub mod stats;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .merge(inbox::router())
        .merge(templates::router())
        .merge(preferences::router())
        .merge(stats::router())
        .with_state(state)
}
