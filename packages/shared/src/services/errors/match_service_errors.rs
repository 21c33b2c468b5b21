use crate::games::MoveError;
use crate::services::errors::room_service_errors::RoomServiceError;

#[derive(Debug)]
pub enum MatchServiceError {
    RoomError(RoomServiceError),
    MoveRejected(MoveError),
    /// The stored state does not decode as the room's game.
    CorruptState(String),
}

impl std::fmt::Display for MatchServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchServiceError::RoomError(err) => write!(f, "{}", err),
            MatchServiceError::MoveRejected(err) => write!(f, "{}", err),
            MatchServiceError::CorruptState(msg) => write!(f, "Stored game state is invalid: {}", msg),
        }
    }
}

impl std::error::Error for MatchServiceError {}

impl From<RoomServiceError> for MatchServiceError {
    fn from(err: RoomServiceError) -> Self {
        MatchServiceError::RoomError(err)
    }
}

impl From<MoveError> for MatchServiceError {
    fn from(err: MoveError) -> Self {
        // A turn violation reads the same whether the room or the rules caught it.
        match err {
            MoveError::OutOfTurn => MatchServiceError::RoomError(RoomServiceError::NotYourTurn),
            other => MatchServiceError::MoveRejected(other),
        }
    }
}

impl From<serde_json::Error> for MatchServiceError {
    fn from(err: serde_json::Error) -> Self {
        MatchServiceError::CorruptState(err.to_string())
    }
}
