use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserEnvelope, UsersEnvelope},
        model::{hash_password, interests_overlap, is_valid_email, User},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/", post(create_user))
        .route("/users", get(list_users).delete(delete_all_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/matchmaking", get(matchmaking))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    // Check-then-insert; not isolated from a concurrent insert of the
    // same email (no unique constraint on the column).
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::BadRequest("Email already registered".into()));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload, &password_hash).await?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = User::find_by_id(&state.db, id).await?;
    Ok(Json(UserEnvelope { user }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(UsersEnvelope { users }))
}

#[instrument(skip(state, bearer, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(bearer): CurrentUser,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    // The bearer's identity is not matched against the target id: any
    // authenticated user may patch any record.
    let mut tx = state.db.begin().await?;

    let Some(mut user) = User::find_by_id(&mut *tx, id).await? else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    user.apply_patch(patch)?;
    user.save(&mut *tx).await?;
    tx.commit().await?;

    info!(user_id = user.id, bearer_id = bearer.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if User::delete(&state.db, id).await? {
        info!(user_id = id, "user deleted");
        Ok(Json(MessageResponse {
            message: "User deleted".into(),
        }))
    } else {
        Err(ApiError::NotFound("User not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn delete_all_users(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = User::delete_all(&state.db).await?;
    info!(removed, "all users deleted");
    Ok(Json(MessageResponse {
        message: "All users deleted".into(),
    }))
}

/// Pairwise scan over every other account, keeping those whose interest set
/// intersects the bearer's. No ranking, no paging; intersection is
/// symmetric, so if A matches B then B matches A.
#[instrument(skip(state, current))]
pub async fn matchmaking(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> Result<Response, ApiError> {
    let Some(user) = User::find_by_id(&state.db, current.id).await? else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    let matches: Vec<User> = User::list_all(&state.db)
        .await?
        .into_iter()
        .filter(|other| other.id != user.id)
        .filter(|other| interests_overlap(user.interests(), other.interests()))
        .collect();

    if matches.is_empty() {
        return Ok(Json(MessageResponse {
            message: "No matches found for your interests".into(),
        })
        .into_response());
    }

    info!(user_id = user.id, matches = matches.len(), "matchmaking done");
    Ok(Json(UsersEnvelope { users: matches }).into_response())
}
