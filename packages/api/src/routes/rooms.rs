use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::games::GameMove;
use shared::models::game_room::{GameRoom, RoomListing};
use shared::models::game_type::GameType;
use shared::services::errors::room_service_errors::RoomServiceError;
use shared::services::match_service::MoveOutcome;
use shared::services::room_service::LeaveOutcome;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/code/{code}", get(get_room_by_code))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/code/{code}/join", post(join_room_by_code))
        .route("/rooms/{id}/moves", post(submit_move).get(legal_moves))
        .route("/rooms/{id}/state", put(update_state))
        .route("/rooms/{id}/finish", post(finish_room))
        .route("/rooms/{id}/leave", post(leave_room))
}

#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    pub game_type: Option<GameType>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub game_type: GameType,
}

/// Raw state write for clients that run the rules themselves.
#[derive(Debug, Deserialize)]
pub struct UpdateStateRequest {
    pub game_state: serde_json::Value,
    pub current_turn: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishRequest {
    #[serde(default)]
    pub winner_id: Option<String>,
    #[serde(default)]
    pub is_draw: bool,
}

async fn list_rooms(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<RoomListing>>, ApiError> {
    Ok(Json(state.room_service.list(query.game_type).await?))
}

async fn create_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<GameRoom>), ApiError> {
    let room = state
        .room_service
        .create(payload.game_type, &authenticated_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn get_room(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    Ok(Json(state.room_service.get(&room_id).await?))
}

async fn get_room_by_code(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    Ok(Json(state.room_service.get_by_code(&code).await?))
}

async fn join_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state
        .match_service
        .join(&room_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(room))
}

async fn join_room_by_code(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state
        .match_service
        .join_by_code(&code, &authenticated_user.user_id)
        .await?;
    Ok(Json(room))
}

async fn submit_move(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(mv): Json<GameMove>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let outcome = state
        .match_service
        .submit_move(&room_id, &authenticated_user.user_id, &mv)
        .await
        .map_err(|e| {
            debug!("Move from {} in {} rejected: {}", authenticated_user.user_id, room_id, e);
            ApiError::from(e)
        })?;
    Ok(Json(outcome))
}

async fn legal_moves(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<GameMove>>, ApiError> {
    let moves = state
        .match_service
        .legal_moves(&room_id, &authenticated_user.user_id)
        .await?;
    Ok(Json(moves))
}

async fn update_state(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(payload): Json<UpdateStateRequest>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state
        .room_service
        .update_state(
            &room_id,
            &authenticated_user.user_id,
            payload.game_state,
            &payload.current_turn,
        )
        .await?;
    Ok(Json(room))
}

async fn finish_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(payload): Json<FinishRequest>,
) -> Result<Json<GameRoom>, ApiError> {
    let room = state.room_service.get(&room_id).await?;
    if !room.is_participant(&authenticated_user.user_id) {
        return Err(RoomServiceError::NotParticipant.into());
    }
    let room = state
        .match_service
        .finish(&room_id, payload.winner_id.as_deref(), payload.is_draw)
        .await?;
    info!("{} closed room {}", authenticated_user.user_id, room_id);
    Ok(Json(room))
}

async fn leave_room(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state
        .match_service
        .leave(&room_id, &authenticated_user.user_id)
        .await?;
    Ok(match outcome {
        LeaveOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
        LeaveOutcome::Forfeited(room) => Json(room).into_response(),
    })
}
