pub mod auth_service_errors;
pub mod match_service_errors;
pub mod room_service_errors;
pub mod stats_service_errors;
