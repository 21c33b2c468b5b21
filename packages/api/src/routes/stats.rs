use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::game_stat::GameStat;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_own_stats))
        .route("/users/{id}/stats", get(get_user_stats))
}

async fn get_own_stats(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<Vec<GameStat>>, ApiError> {
    stats_for(&state, &authenticated_user.user_id).await
}

async fn get_user_stats(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GameStat>>, ApiError> {
    stats_for(&state, &user_id).await
}

async fn stats_for(state: &AppState, user_id: &str) -> Result<Json<Vec<GameStat>>, ApiError> {
    state
        .stats_service
        .get_user_stats(user_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to load stats for {}: {}", user_id, e);
            ApiError::from(e)
        })
}
