pub mod errors;
pub mod room_repository;
pub mod stats_repository;
pub mod user_repository;
