use crate::auth::{require_active_employee, require_staff};
use crate::handlers::{
    admin::{clear_debt, get_admin_network_entities},
    health::health_check,
    network_entities::{
        create_network_entity, delete_network_entity, get_network_entities, get_network_entity,
        update_network_entity,
    },
    users::{login, logout, obtain_token_pair, refresh_token, register},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Entity management is gated to active employees
    let entity_routes = Router::new()
        .route("/api/v1/network-entities", post(create_network_entity))
        .route("/api/v1/network-entities", get(get_network_entities))
        .route("/api/v1/network-entities/:entity_id", get(get_network_entity))
        .route("/api/v1/network-entities/:entity_id", put(update_network_entity))
        .route(
            "/api/v1/network-entities/:entity_id",
            delete(delete_network_entity),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_active_employee,
        ));

    // Back-office operations are gated to staff
    let admin_routes = Router::new()
        .route("/api/v1/admin/network-entities", get(get_admin_network_entities))
        .route("/api/v1/admin/network-entities/clear-debt", post(clear_debt))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/token", post(obtain_token_pair))
        .route("/api/v1/auth/token/refresh", post(refresh_token));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(entity_routes)
        .merge(admin_routes)
        .merge(auth_routes)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
