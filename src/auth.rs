use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{Json, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use model::entities::user;

use crate::schemas::{AppState, ErrorResponse};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT settings for token issuance and validation
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

// The secret must never end up in span fields or logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, falling back to an insecure development secret");
            "insecure-development-secret".to_string()
        });

        Self {
            jwt_secret,
            access_ttl_minutes: 60,
            refresh_ttl_minutes: 60 * 24,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// Claims embedded in both tokens of a pair. `token_type` distinguishes the
/// short-lived access token from the refresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(user: &user::Model, token_type: &str, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            token_type: token_type.to_string(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Access/refresh token pair issued by the token endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn issue_token_pair(config: &AuthConfig, user: &user::Model) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: encode_token(
            config,
            Claims::new(user, TOKEN_TYPE_ACCESS, config.access_ttl_minutes),
        )?,
        refresh: encode_token(
            config,
            Claims::new(user, TOKEN_TYPE_REFRESH, config.refresh_ttl_minutes),
        )?,
    })
}

fn encode_token(config: &AuthConfig, claims: Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a token's signature and expiry, then require the expected type.
pub fn decode_token(
    config: &AuthConfig,
    token: &str,
    expected_type: &str,
) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let validation = Validation::default();

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|_| AuthError::InvalidToken)?;

    if token_data.claims.token_type != expected_type {
        return Err(AuthError::InvalidToken);
    }

    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Authenticated user attached to the request by the auth middleware
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

/// Permission gate for entity management: only authenticated, active
/// employees pass. Rejections happen before any entity query runs.
pub async fn require_active_employee(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let user = authenticate(&state, request.headers()).await?;

    debug!("Authenticated active employee: {}", user.email);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Permission gate for back-office operations: active staff only.
pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let user = authenticate(&state, request.headers()).await?;

    if !user.is_staff {
        warn!("User {} attempted to access a staff-only endpoint", user.email);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("STAFF_REQUIRED", "Staff access required")),
        ));
    }

    debug!("Authenticated staff user: {}", user.email);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<user::Model, (StatusCode, Json<ErrorResponse>)> {
    let token = extract_bearer_token(headers).map_err(|msg| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("NOT_AUTHENTICATED", msg)),
        )
    })?;

    let claims = decode_token(&state.auth, &token, TOKEN_TYPE_ACCESS).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("NOT_AUTHENTICATED", "Invalid or expired token")),
        )
    })?;

    let user = match user::Entity::find_by_id(claims.sub).one(&state.db).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Token for unknown user id {}", claims.sub);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("NOT_AUTHENTICATED", "Unknown user")),
            ));
        }
        Err(db_error) => {
            error!("Failed to load user {} during authentication: {}", claims.sub, db_error);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("INTERNAL_ERROR", "Internal server error")),
            ));
        }
    };

    if !user.is_active {
        warn!("Inactive user {} rejected", user.email);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("NOT_AUTHENTICATED", "User account is inactive")),
        ));
    }

    Ok(user)
}

/// Extract a token from a `Bearer` Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
