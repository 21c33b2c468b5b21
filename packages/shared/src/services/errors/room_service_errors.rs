use crate::repositories::errors::room_repository_errors::RoomRepositoryError;
use crate::services::errors::stats_service_errors::StatsServiceError;

#[derive(Debug)]
pub enum RoomServiceError {
    NotFound,
    NotYourTurn,
    NotParticipant,
    /// The room is not in the status the operation requires.
    StateConflict(String),
    RoomFull,
    ValidationError(String),
    RepositoryError(RoomRepositoryError),
    StatsError(StatsServiceError),
}

impl std::fmt::Display for RoomServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomServiceError::NotFound => write!(f, "room not found"),
            RoomServiceError::NotYourTurn => write!(f, "not your turn"),
            RoomServiceError::NotParticipant => write!(f, "you are not a participant in this room"),
            RoomServiceError::StateConflict(msg) => write!(f, "{}", msg),
            RoomServiceError::RoomFull => write!(f, "room already has two players"),
            RoomServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RoomServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            RoomServiceError::StatsError(err) => write!(f, "Stats error: {}", err),
        }
    }
}

impl std::error::Error for RoomServiceError {}

impl From<RoomRepositoryError> for RoomServiceError {
    fn from(err: RoomRepositoryError) -> Self {
        match err {
            RoomRepositoryError::NotFound => RoomServiceError::NotFound,
            RoomRepositoryError::ConditionFailed => RoomServiceError::StateConflict(
                "room was changed by another request, reload and retry".to_string(),
            ),
            other => RoomServiceError::RepositoryError(other),
        }
    }
}

impl From<StatsServiceError> for RoomServiceError {
    fn from(err: StatsServiceError) -> Self {
        RoomServiceError::StatsError(err)
    }
}
