use serde::{Deserialize, Serialize};

use crate::users::model::{Gender, User};

/// Registration payload. `id` and `username` are intentionally absent:
/// storage assigns the id and the username mirrors the email.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub gender: Gender,
    pub age: i64,
    pub interests: Vec<String>,
}

/// Partial update; only present fields are applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub interests: Option<Vec<String>>,
}

/// Get-by-id answers 200 with a null user rather than 404.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
