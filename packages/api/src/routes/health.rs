use axum::http::StatusCode;

/// Liveness check; needs no token.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Healthy!")
}
