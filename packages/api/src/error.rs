use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use shared::games::MoveError;
use shared::services::errors::{
    auth_service_errors::AuthServiceError, match_service_errors::MatchServiceError,
    room_service_errors::RoomServiceError, stats_service_errors::StatsServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    AuthService(AuthServiceError),
    RoomService(RoomServiceError),
    MatchService(MatchServiceError),
    StatsService(StatsServiceError),
    Unauthorized,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_action: Option<&'static str>,
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<RoomServiceError> for ApiError {
    fn from(error: RoomServiceError) -> Self {
        ApiError::RoomService(error)
    }
}

impl From<MatchServiceError> for ApiError {
    fn from(error: MatchServiceError) -> Self {
        ApiError::MatchService(error)
    }
}

impl From<StatsServiceError> for ApiError {
    fn from(error: StatsServiceError) -> Self {
        ApiError::StatsService(error)
    }
}

const INTERNAL: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "internal");

fn room_status(error: &RoomServiceError) -> (StatusCode, &'static str) {
    match error {
        RoomServiceError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        RoomServiceError::NotYourTurn | RoomServiceError::NotParticipant => {
            (StatusCode::FORBIDDEN, "turn")
        }
        RoomServiceError::StateConflict(_) => (StatusCode::CONFLICT, "state_conflict"),
        RoomServiceError::RoomFull => (StatusCode::CONFLICT, "capacity"),
        RoomServiceError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        RoomServiceError::RepositoryError(_) | RoomServiceError::StatsError(_) => INTERNAL,
    }
}

fn move_status(error: &MoveError) -> (StatusCode, &'static str) {
    match error {
        MoveError::Validation(_) | MoveError::WrongGame { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "validation")
        }
        MoveError::Exhaustion(_) => (StatusCode::UNPROCESSABLE_ENTITY, "exhaustion"),
        MoveError::OutOfTurn => (StatusCode::FORBIDDEN, "turn"),
        MoveError::GameOver => (StatusCode::CONFLICT, "state_conflict"),
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::RoomService(e) | ApiError::MatchService(MatchServiceError::RoomError(e)) => {
                room_status(e)
            }
            ApiError::MatchService(MatchServiceError::MoveRejected(e)) => move_status(e),
            ApiError::MatchService(MatchServiceError::CorruptState(_)) => INTERNAL,

            ApiError::StatsService(StatsServiceError::ValidationError(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation")
            }
            ApiError::StatsService(StatsServiceError::RepositoryError(_)) => INTERNAL,

            ApiError::AuthService(AuthServiceError::JwtError(_)) => INTERNAL,
            ApiError::AuthService(
                AuthServiceError::InvalidToken | AuthServiceError::ExpiredToken,
            )
            | ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::AuthService(e) => e.to_string(),
            ApiError::RoomService(e) => e.to_string(),
            ApiError::MatchService(e) => e.to_string(),
            ApiError::StatsService(e) => e.to_string(),
            ApiError::Unauthorized => "missing or malformed bearer token".to_string(),
        }
    }

    fn available_action(&self) -> Option<&'static str> {
        match self {
            ApiError::MatchService(MatchServiceError::MoveRejected(MoveError::Exhaustion(e))) => {
                Some(e.available_action())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.message());
            "internal server error".to_string()
        } else {
            self.message()
        };

        let body = ErrorBody {
            error,
            kind,
            available_action: self.available_action(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::games::Exhaustion;

    #[test]
    fn test_exhaustion_carries_the_alternative() {
        let error = ApiError::MatchService(MatchServiceError::MoveRejected(
            MoveError::Exhaustion(Exhaustion::MustPass),
        ));

        assert_eq!(
            error.status_and_kind(),
            (StatusCode::UNPROCESSABLE_ENTITY, "exhaustion")
        );
        assert_eq!(error.available_action(), Some("pass"));
    }

    #[test]
    fn test_turn_errors_are_forbidden_wherever_they_arise() {
        let from_room = ApiError::from(RoomServiceError::NotYourTurn);
        let from_match = ApiError::from(MatchServiceError::from(MoveError::OutOfTurn));

        assert_eq!(from_room.status_and_kind().0, StatusCode::FORBIDDEN);
        assert_eq!(from_match.status_and_kind().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_capacity_and_conflict_share_status_but_not_kind() {
        let full = ApiError::from(RoomServiceError::RoomFull);
        let conflict = ApiError::from(RoomServiceError::StateConflict("finished".to_string()));

        assert_eq!(full.status_and_kind(), (StatusCode::CONFLICT, "capacity"));
        assert_eq!(
            conflict.status_and_kind(),
            (StatusCode::CONFLICT, "state_conflict")
        );
    }
}
