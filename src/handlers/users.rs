use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use model::entities::user;

use crate::auth::{
    self, issue_token_pair, verify_password, TokenPair, TOKEN_TYPE_REFRESH,
};
use crate::handlers::network_entities::internal_error;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for registering a new user
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, message = "This field may not be blank."),
        email(message = "Enter a valid email address.")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Stored path of the avatar image
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// Request body for login and token issuance
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for refreshing a token pair
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// User response model. The password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            avatar: model.avatar,
            phone: model.phone,
            country: model.country,
        }
    }
}

/// Lowercase the domain part of an email address, the normalization the
/// account layer applies before storing or matching emails.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering register function");

    if let Err(validation_errors) = request.validate() {
        warn!("Registration rejected by validation: {}", validation_errors);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from_validation(&validation_errors)),
        ));
    }

    let email = normalize_email(&request.email);
    debug!("Registering user with email: {}", email);

    match find_by_email(&state, &email).await {
        Ok(Some(_)) => {
            warn!("Registration with already used email: {}", email);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::field("email", "User with this email already exists.")),
            ));
        }
        Ok(None) => {}
        Err(db_error) => {
            error!("Failed to check email uniqueness for {}: {}", email, db_error);
            return Err(internal_error());
        }
    }

    let password_hash = match auth::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password during registration: {}", e);
            return Err(internal_error());
        }
    };

    let new_user = user::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        first_name: Set(request.first_name.clone()),
        last_name: Set(request.last_name.clone()),
        avatar: Set(request.avatar.clone()),
        phone: Set(request.phone.clone()),
        country: Set(request.country.clone()),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        date_joined: Set(Utc::now()),
        ..Default::default()
    };

    trace!("Attempting to insert new user into database");
    match new_user.insert(&state.db).await {
        Ok(user_model) => {
            info!("User registered successfully with ID: {}, email: {}", user_model.id, user_model.email);
            let response = ApiResponse {
                data: UserResponse::from(user_model),
                message: "User registered successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to register user '{}': {}", email, db_error);

            // Registration races with itself on the unique email column
            let error_response = match db_error {
                DbErr::Exec(ref exec_err)
                    if exec_err.to_string().to_lowercase().contains("unique") =>
                {
                    ErrorResponse::field("email", "User with this email already exists.")
                }
                _ => ErrorResponse::new("INTERNAL_ERROR", "Failed to register user"),
            };
            let status = if error_response.fields.is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, Json(error_response)))
        }
    }
}

/// Verify credentials and report success or failure
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<String>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering login function");

    let user = verify_credentials(&state, &request).await?;
    stamp_last_login(&state, &user).await;

    info!("User {} logged in", user.email);
    Ok(Json(ApiResponse {
        data: user.email,
        message: "Login successful".to_string(),
        success: true,
    }))
}

/// End the client session. Tokens are stateless, so there is nothing to
/// revoke server-side; clients drop their pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = ApiResponse<String>)
    )
)]
#[instrument]
pub async fn logout() -> Json<ApiResponse<String>> {
    trace!("Entering logout function");

    Json(ApiResponse {
        data: "Logged out".to_string(),
        message: "Logout successful".to_string(),
        success: true,
    })
}

/// Issue an access/refresh JWT pair for valid credentials
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Token pair issued", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn obtain_token_pair(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering obtain_token_pair function");

    let user = verify_credentials(&state, &request).await?;

    let pair = match issue_token_pair(&state.auth, &user) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to issue token pair for {}: {}", user.email, e);
            return Err(internal_error());
        }
    };

    stamp_last_login(&state, &user).await;

    info!("Issued token pair for {}", user.email);
    Ok(Json(ApiResponse {
        data: pair,
        message: "Token pair issued successfully".to_string(),
        success: true,
    }))
}

/// Exchange a valid refresh token for a new pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/token/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair issued", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering refresh_token function");

    let claims = match auth::decode_token(&state.auth, &request.refresh, TOKEN_TYPE_REFRESH) {
        Ok(claims) => claims,
        Err(_) => {
            warn!("Refresh attempted with an invalid token");
            return Err(unauthorized());
        }
    };

    let user = match user::Entity::find_by_id(claims.sub).one(&state.db).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            warn!("Refresh attempted for missing or inactive user {}", claims.sub);
            return Err(unauthorized());
        }
        Err(db_error) => {
            error!("Failed to load user {} for refresh: {}", claims.sub, db_error);
            return Err(internal_error());
        }
    };

    let pair = match issue_token_pair(&state.auth, &user) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to issue refreshed pair for {}: {}", user.email, e);
            return Err(internal_error());
        }
    };

    info!("Refreshed token pair for {}", user.email);
    Ok(Json(ApiResponse {
        data: pair,
        message: "Token pair issued successfully".to_string(),
        success: true,
    }))
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await
}

/// Check email/password against the store; only active accounts pass.
async fn verify_credentials(
    state: &AppState,
    request: &CredentialsRequest,
) -> Result<user::Model, (StatusCode, Json<ErrorResponse>)> {
    let email = normalize_email(&request.email);

    let user = match find_by_email(state, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Login attempt for unknown email: {}", email);
            return Err(unauthorized());
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", email, db_error);
            return Err(internal_error());
        }
    };

    if !user.is_active {
        warn!("Login attempt for inactive user: {}", email);
        return Err(unauthorized());
    }

    if !verify_password(&request.password, &user.password_hash) {
        warn!("Wrong password for user: {}", email);
        return Err(unauthorized());
    }

    Ok(user)
}

async fn stamp_last_login(state: &AppState, user: &user::Model) {
    let mut user_active: user::ActiveModel = user.clone().into();
    user_active.last_login = Set(Some(Utc::now()));
    if let Err(db_error) = user_active.update(&state.db).await {
        // Login itself succeeded; a failed stamp is not worth failing it
        warn!("Failed to stamp last_login for {}: {}", user.email, db_error);
    }
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("INVALID_CREDENTIALS", "Invalid email or password")),
    )
}
