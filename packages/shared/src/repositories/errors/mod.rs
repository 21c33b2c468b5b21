pub mod room_repository_errors;
pub mod stats_repository_errors;
pub mod user_repository_errors;
