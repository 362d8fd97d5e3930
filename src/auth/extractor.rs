use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{error, warn};

use crate::{error::ApiError, state::AppState, users::model::User};

use super::jwt::JwtKeys;

/// Resolves the request's bearer token back to its user row. Every
/// protected route depends on this before running.
pub struct CurrentUser(pub User);

fn credentials_error() -> ApiError {
    ApiError::Unauthorized("Could not validate credentials".into())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(credentials_error)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(credentials_error)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            credentials_error()
        })?;

        let user = User::find_by_username(&state.db, &claims.sub)
            .await
            .map_err(|e| {
                error!(error = %e, "user lookup failed");
                ApiError::AuthInternal("An error occurred while retrieving the user".into())
            })?;

        user.map(CurrentUser).ok_or_else(credentials_error)
    }
}
