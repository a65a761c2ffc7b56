use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::auth::AuthConfig;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// JWT settings used for token issuance and the permission gate
    pub auth: AuthConfig,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation messages, present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<HashMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
            fields: None,
        }
    }

    /// A validation failure on a single named field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = HashMap::new();
        fields.insert(field.to_string(), vec![message.into()]);
        Self {
            error: "Validation failed".to_string(),
            code: "VALIDATION_ERROR".to_string(),
            success: false,
            fields: Some(fields),
        }
    }

    /// Flatten `validator` output into per-field messages. Nested structs
    /// use dotted paths ("contact.email"), lists indexed paths
    /// ("products[0].name").
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut fields = HashMap::new();
        collect_validation_errors("", errors, &mut fields);
        Self {
            error: "Validation failed".to_string(),
            code: "VALIDATION_ERROR".to_string(),
            success: false,
            fields: Some(fields),
        }
    }
}

fn collect_validation_errors(
    prefix: &str,
    errors: &ValidationErrors,
    out: &mut HashMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::network_entities::get_network_entities,
        crate::handlers::network_entities::get_network_entity,
        crate::handlers::network_entities::create_network_entity,
        crate::handlers::network_entities::update_network_entity,
        crate::handlers::network_entities::delete_network_entity,
        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::users::logout,
        crate::handlers::users::obtain_token_pair,
        crate::handlers::users::refresh_token,
        crate::handlers::admin::get_admin_network_entities,
        crate::handlers::admin::clear_debt,
    ),
    components(
        schemas(
            ApiResponse<crate::handlers::network_entities::NetworkEntityResponse>,
            ApiResponse<Vec<crate::handlers::network_entities::NetworkEntityResponse>>,
            ApiResponse<crate::handlers::users::UserResponse>,
            ApiResponse<crate::auth::TokenPair>,
            ApiResponse<String>,
            ApiResponse<u64>,
            ErrorResponse,
            HealthResponse,
            crate::handlers::network_entities::ContactPayload,
            crate::handlers::network_entities::ProductPayload,
            crate::handlers::network_entities::CreateNetworkEntityRequest,
            crate::handlers::network_entities::UpdateNetworkEntityRequest,
            crate::handlers::network_entities::ContactResponse,
            crate::handlers::network_entities::ProductResponse,
            crate::handlers::network_entities::NetworkEntityResponse,
            crate::handlers::users::RegisterRequest,
            crate::handlers::users::CredentialsRequest,
            crate::handlers::users::RefreshRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::admin::ClearDebtRequest,
            crate::auth::TokenPair,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "network-entities", description = "Distribution network entity management"),
        (name = "auth", description = "Registration, login and token endpoints"),
        (name = "admin", description = "Staff-only back-office operations"),
    ),
    info(
        title = "Electronet API",
        description = "Electronics distribution network backend - hierarchical supplier tracking with contacts, products and debt balances",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
