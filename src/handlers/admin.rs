use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use model::entities::{contact, network_entity};

use crate::auth::CurrentUser;
use crate::handlers::network_entities::{
    entity_response, internal_error, NetworkEntityResponse,
};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Query parameters for the back-office entity list
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminListQuery {
    /// Restrict to entities whose contact is in this city
    pub city: Option<String>,
}

/// Request body for bulk debt clearing
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ClearDebtRequest {
    /// Ids of the entities whose debt is zeroed
    #[validate(length(min = 1, message = "Select at least one entity."))]
    pub ids: Vec<i32>,
}

/// Back-office entity list, filterable by contact city
#[utoipa::path(
    get,
    path = "/api/v1/admin/network-entities",
    tag = "admin",
    params(
        ("city" = Option<String>, Query, description = "Filter by contact city"),
    ),
    responses(
        (status = 200, description = "Entities retrieved successfully", body = ApiResponse<Vec<NetworkEntityResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Staff access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_admin_network_entities(
    Query(query): Query<AdminListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NetworkEntityResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_admin_network_entities function");
    debug!("Fetching entities for back office, city filter: {:?}", query.city);

    let mut select = network_entity::Entity::find();
    if let Some(city) = &query.city {
        select = select
            .join(JoinType::InnerJoin, network_entity::Relation::Contact.def())
            .filter(contact::Column::City.eq(city.clone()));
    }

    let entities = match select.all(&state.db).await {
        Ok(entities) => entities,
        Err(db_error) => {
            error!("Failed to retrieve entities for back office: {}", db_error);
            return Err(internal_error());
        }
    };

    let entity_count = entities.len();
    let mut responses = Vec::with_capacity(entity_count);
    for entity in entities {
        let level = match entity.hierarchy_level(&state.db).await {
            Ok(level) => level,
            Err(db_error) => {
                error!("Failed to derive level for entity {}: {}", entity.id, db_error);
                return Err(internal_error());
            }
        };
        match entity_response(&state.db, level, entity).await {
            Ok(response) => responses.push(response),
            Err(db_error) => {
                error!("Failed to assemble entity response: {}", db_error);
                return Err(internal_error());
            }
        }
    }

    info!("Back office retrieved {} entities", entity_count);
    Ok(Json(ApiResponse {
        data: responses,
        message: "Network entities retrieved successfully".to_string(),
        success: true,
    }))
}

/// Zero the debt of the selected entities
#[utoipa::path(
    post,
    path = "/api/v1/admin/network-entities/clear-debt",
    tag = "admin",
    request_body = ClearDebtRequest,
    responses(
        (status = 200, description = "Debt cleared", body = ApiResponse<u64>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Staff access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn clear_debt(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Json(request): Json<ClearDebtRequest>,
) -> Result<Json<ApiResponse<u64>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering clear_debt function");

    if let Err(validation_errors) = request.validate() {
        warn!("Debt clearing rejected by validation: {}", validation_errors);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from_validation(&validation_errors)),
        ));
    }

    debug!(
        "Staff user {} clearing debt on entities: {:?}",
        current_user.email, request.ids
    );

    let result = network_entity::Entity::update_many()
        .col_expr(network_entity::Column::Debt, Expr::value(Decimal::ZERO))
        .filter(network_entity::Column::Id.is_in(request.ids.clone()))
        .exec(&state.db)
        .await;

    match result {
        Ok(update_result) => {
            info!("Cleared debt on {} entities", update_result.rows_affected);
            Ok(Json(ApiResponse {
                data: update_result.rows_affected,
                message: "Debt cleared successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to clear debt: {}", db_error);
            Err(internal_error())
        }
    }
}
