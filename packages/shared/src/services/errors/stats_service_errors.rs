use crate::repositories::errors::stats_repository_errors::StatsRepositoryError;

#[derive(Debug)]
pub enum StatsServiceError {
    RepositoryError(StatsRepositoryError),
    ValidationError(String),
}

impl std::fmt::Display for StatsServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            StatsServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for StatsServiceError {}

impl From<StatsRepositoryError> for StatsServiceError {
    fn from(err: StatsRepositoryError) -> Self {
        StatsServiceError::RepositoryError(err)
    }
}
