use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    /// Unexpected failure on a credential path. Answers 500 but still
    /// carries the bearer challenge, like its 401 sibling.
    #[error("{0}")]
    AuthInternal(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, challenge) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, true),
            ApiError::AuthInternal(_) => (StatusCode::INTERNAL_SERVER_ERROR, true),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };
        let body = Json(json!({ "detail": self.to_string() }));
        let mut response = (status, body).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = ApiError::Unauthorized("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn auth_internal_is_500_with_challenge() {
        let response = ApiError::AuthInternal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn not_found_has_no_challenge() {
        let response = ApiError::NotFound("gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
