//! Bearer-token authentication and per-institution access control.
//!
//! Tokens are signed JWTs carrying the user id in `sub`. Access control
//! keys off the roles a user holds per institution; the solver core itself
//! is auth-unaware.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::models::User;
use crate::data::users;
use crate::state::AppState;
use crate::web::error::{ApiError, db_error};

/// Signing material and token policy, built once at startup.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    token_lifetime: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

impl AuthKeys {
    pub fn new(secret: &str, algorithm: &str, expires_minutes: u64) -> anyhow::Result<Self> {
        let algorithm = Algorithm::from_str(algorithm)
            .with_context(|| format!("unsupported JWT algorithm {algorithm}"))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation: Validation::new(algorithm),
            token_lifetime: Duration::from_secs(expires_minutes * 60),
        })
    }

    /// Issues a token whose subject is the user id.
    pub fn create_token(&self, user_id: &str) -> Result<String, ApiError> {
        let expires_at = Utc::now() + self.token_lifetime;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp() as usize,
        };
        jsonwebtoken::encode(&self.header, &claims, &self.encoding)
            .map_err(|_| ApiError::unauthorized("could not issue token"))
    }

    /// Verifies signature and expiry, returning the subject user id.
    pub fn verify_token(&self, token: &str) -> Result<String, ApiError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("token has expired")
                }
                _ => ApiError::unauthorized("invalid token"),
            })?;
        Ok(data.claims.sub)
    }
}

/// The authenticated caller, resolved to its user document.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        let user_id = state.auth.verify_token(token)?;
        let user = users::find_by_id(&state.db, &user_id)
            .await
            .map_err(|e| db_error("User lookup", e))?
            .ok_or_else(|| ApiError::unauthorized("token subject no longer exists"))?;
        Ok(AuthUser(user))
    }
}

/// 403 unless the user holds any role at the institution.
pub fn require_member(user: &User, institution_id: &str) -> Result<(), ApiError> {
    if user.is_member_of(institution_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "user {} has no access to institution {institution_id}",
            user.id
        )))
    }
}

/// 403 unless the user holds the admin role at the institution.
pub fn require_admin(user: &User, institution_id: &str) -> Result<(), ApiError> {
    if user.is_admin_of(institution_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "user {} does not have admin rights for institution {institution_id}",
            user.id
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// `POST /auth/token` -- password login.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = users::find_by_email(&state.db, &request.email)
        .await
        .map_err(|e| db_error("User lookup", e))?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    let valid = bcrypt::verify(&request.password, &user.hashed_password)
        .map_err(|_| ApiError::unauthorized("invalid credentials"))?;
    if !valid {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let access_token = state.auth.create_token(&user.id)?;
    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: crate::web::users::UserView,
}

/// `GET /auth/me` -- the caller's own record.
pub async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user: user.into() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_subject() {
        let keys = AuthKeys::new("test-secret", "HS256", 30).unwrap();
        let token = keys.create_token("user-1").unwrap();
        assert_eq!(keys.verify_token(&token).unwrap(), "user-1");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = AuthKeys::new("test-secret", "HS256", 30).unwrap();
        let other = AuthKeys::new("other-secret", "HS256", 30).unwrap();
        let token = keys.create_token("user-1").unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        assert!(AuthKeys::new("secret", "bogus", 30).is_err());
    }
}
