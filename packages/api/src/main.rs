use lambda_http::Error;
use std::env::{set_var, var};
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::state::AppState;
use shared::config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::from_config(&config).await;
    let app = api::app(app_state);

    if var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");
        info!("Starting under the Lambda runtime");
        return lambda_http::run(app).await;
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
