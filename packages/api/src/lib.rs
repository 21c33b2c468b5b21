use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// The full HTTP surface with CORS applied and state attached.
pub fn app(app_state: AppState) -> Router {
    // ToDo: Tighten this up once the web client has a fixed origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::rooms::routes())
        .merge(routes::stats::routes())
        .layer(cors)
        .with_state(app_state)
}
