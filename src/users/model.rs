use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqliteExecutor};
use tracing::error;

use crate::users::dto::{CreateUserRequest, UpdateUserRequest};

const USER_COLUMNS: &str = "id, username, password, first_name, last_name, email, \
                            phone_number, city, gender, age, full_name, interests";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// User row. `username` mirrors `email` at creation and is never settable by
/// the client; `full_name` is derived once at creation. The password column
/// holds an argon2 hash and is never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub gender: Gender,
    pub age: Option<i64>,
    pub full_name: Option<String>,
    pub interests: Option<Json<Vec<String>>>,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// True when the two interest lists share at least one entry.
pub fn interests_overlap(a: &[String], b: &[String]) -> bool {
    b.iter().any(|interest| a.contains(interest))
}

impl User {
    pub fn verify_password(&self, plain: &str) -> anyhow::Result<bool> {
        verify_password(plain, &self.password)
    }

    pub fn interests(&self) -> &[String] {
        self.interests.as_ref().map(|j| j.0.as_slice()).unwrap_or(&[])
    }

    /// Applies a partial patch. Only present fields are written; a present
    /// password is re-hashed; interests are unioned with what is already
    /// stored, never replaced or removed. `full_name` stays as derived at
    /// creation.
    pub fn apply_patch(&mut self, patch: UpdateUserRequest) -> anyhow::Result<()> {
        if let Some(password) = patch.password {
            self.password = hash_password(&password)?;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(phone_number) = patch.phone_number {
            self.phone_number = phone_number;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(incoming) = patch.interests {
            let mut merged = self.interests.take().map(|j| j.0).unwrap_or_default();
            for interest in incoming {
                if !merged.contains(&interest) {
                    merged.push(interest);
                }
            }
            self.interests = Some(Json(merged));
        }
        Ok(())
    }

    pub async fn create(
        db: impl SqliteExecutor<'_>,
        req: &CreateUserRequest,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email,
                               phone_number, city, gender, age, full_name, interests)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&req.email) // username = email, by construction
        .bind(password_hash)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.phone_number)
        .bind(&req.city)
        .bind(req.gender)
        .bind(req.age)
        .bind(format!("{} {}", req.first_name, req.last_name))
        .bind(Json(&req.interests))
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(
        db: impl SqliteExecutor<'_>,
        id: i64,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(
        db: impl SqliteExecutor<'_>,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(
        db: impl SqliteExecutor<'_>,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: impl SqliteExecutor<'_>) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(db)
            .await?;
        Ok(users)
    }

    /// Persists every mutable column of this row.
    pub async fn save(&self, db: impl SqliteExecutor<'_>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password = ?, first_name = ?, last_name = ?, phone_number = ?,
                city = ?, gender = ?, age = ?, full_name = ?, interests = ?
            WHERE id = ?
            "#,
        )
        .bind(&self.password)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.phone_number)
        .bind(&self.city)
        .bind(self.gender)
        .bind(self.age)
        .bind(&self.full_name)
        .bind(&self.interests)
        .bind(self.id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Returns whether a row was actually removed.
    pub async fn delete(db: impl SqliteExecutor<'_>, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all(db: impl SqliteExecutor<'_>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(db).await?;
        Ok(result.rows_affected())
    }
}
