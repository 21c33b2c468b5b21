pub mod auth_service;
pub mod errors;
pub mod match_service;
pub mod room_locks;
pub mod room_service;
pub mod stats_service;
