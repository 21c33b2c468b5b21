use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use tracing::debug;

use crate::{error::ApiError, state::AppState};
use shared::services::auth_service::AuthServiceTrait;

/// The caller's user id, taken from the `sub` claim of a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user_id = state
            .auth_service
            .extract_user_id_from_token(token)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                ApiError::from(e)
            })?;

        Ok(AuthenticatedUser { user_id })
    }
}
