use axum::{
    extract::{FromRef, State},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{error::ApiError, state::AppState, users::model::User};

use super::jwt::JwtKeys;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = User::find_by_username(&state.db, &form.username)
        .await
        .map_err(|e| {
            error!(error = %e, "login user lookup failed");
            ApiError::AuthInternal(format!("An error occurred during login, {e}"))
        })?;

    let user = user.ok_or_else(|| {
        warn!(username = %form.username, "login unknown username");
        ApiError::Unauthorized("Incorrect username or password".into())
    })?;

    let ok = user.verify_password(&form.password).map_err(|e| {
        error!(error = %e, "password verification failed");
        ApiError::AuthInternal(format!("An error occurred during login, {e}"))
    })?;

    if !ok {
        warn!(username = %form.username, user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized(
            "Incorrect username or password".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user.username).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::AuthInternal(format!("An error occurred during login, {e}"))
    })?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
