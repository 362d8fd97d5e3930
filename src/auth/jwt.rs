use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

/// JWT payload. `sub` is the username the token was minted for.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub access_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        Self {
            encoding: EncodingKey::from_secret(jwt.secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt.secret.as_bytes()),
            access_ttl: Duration::minutes(jwt.ttl_minutes),
        }
    }
}

impl JwtKeys {
    /// Signs a token for `subject` expiring after `ttl`. A missing ttl falls
    /// back to 15 minutes; login always passes the configured ttl, so the
    /// fallback only matters to direct callers.
    pub fn sign(&self, subject: &str, ttl: Option<Duration>) -> anyhow::Result<String> {
        let exp = OffsetDateTime::now_utc() + ttl.unwrap_or(Duration::minutes(15));
        let claims = Claims {
            sub: subject.to_owned(),
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, subject: &str) -> anyhow::Result<String> {
        self.sign(subject, Some(self.access_ttl))
    }

    /// Verifies signature and expiry; a missing `sub` fails deserialization.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
