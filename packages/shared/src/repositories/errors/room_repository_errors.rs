#[derive(Debug)]
pub enum RoomRepositoryError {
    NotFound,
    /// A conditional write lost to another writer or targeted a missing room.
    ConditionFailed,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for RoomRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRepositoryError::NotFound => write!(f, "Room not found"),
            RoomRepositoryError::ConditionFailed => write!(f, "Conditional write failed"),
            RoomRepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RoomRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for RoomRepositoryError {}
