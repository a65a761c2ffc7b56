use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    JoinType, ModelTrait, QueryFilter, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use model::entities::{contact, network_entity, product};

use crate::auth::CurrentUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Contact block embedded in entity create/update payloads
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ContactPayload {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub country: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub city: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub street: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub house_number: String,
}

/// Product block embedded in entity create/update payloads. On update, an
/// `id` targets an existing product of the entity; without one a new
/// product is created. Products omitted from the payload are left alone.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProductPayload {
    pub id: Option<i32>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub name: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub model: String,
    pub release_date: NaiveDate,
}

/// Request body for creating a network entity. The debt field is not part
/// of the payload and cannot be set by clients.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateNetworkEntityRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub name: String,
    /// Id of the immediate supplier entity
    pub supplier: Option<i32>,
    #[validate(nested)]
    pub contact: ContactPayload,
    #[validate(nested)]
    #[serde(default)]
    pub products: Vec<ProductPayload>,
}

/// Request body for updating a network entity. Absent fields are left
/// untouched.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateNetworkEntityRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub name: Option<String>,
    /// Id of the new immediate supplier entity
    pub supplier: Option<i32>,
    #[validate(nested)]
    pub contact: Option<ContactPayload>,
    #[validate(nested)]
    #[serde(default)]
    pub products: Vec<ProductPayload>,
}

/// Query parameters for the entity list
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListNetworkEntitiesQuery {
    /// Restrict to entities whose contact is in this country
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub id: i32,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

impl From<contact::Model> for ContactResponse {
    fn from(model: contact::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            country: model.country,
            city: model.city,
            street: model.street,
            house_number: model.house_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            model: model.model,
            release_date: model.release_date,
        }
    }
}

/// Nested read model: the entity with its derived hierarchy level, its
/// contact and its products.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NetworkEntityResponse {
    pub id: i32,
    pub name: String,
    pub supplier: Option<i32>,
    /// Derived hierarchy depth: 0, 1 or 2
    pub level: i32,
    pub debt: Decimal,
    pub created_at: DateTime<Utc>,
    pub contact: Option<ContactResponse>,
    pub products: Vec<ProductResponse>,
}

/// Assemble the nested read model for one entity. The caller supplies the
/// derived level so list endpoints can compute it from one supplier map.
pub(crate) async fn entity_response(
    db: &(impl ConnectionTrait + Sync),
    level: i32,
    entity: network_entity::Model,
) -> Result<NetworkEntityResponse, DbErr> {
    let contact = entity.find_related(contact::Entity).one(db).await?;
    let products = entity.find_related(product::Entity).all(db).await?;

    Ok(NetworkEntityResponse {
        id: entity.id,
        supplier: entity.supplier_id,
        level,
        debt: entity.debt,
        created_at: entity.created_at,
        name: entity.name,
        contact: contact.map(ContactResponse::from),
        products: products.into_iter().map(ProductResponse::from).collect(),
    })
}

/// List network entities with nested contact and products, optionally
/// filtered by contact country.
#[utoipa::path(
    get,
    path = "/api/v1/network-entities",
    tag = "network-entities",
    params(
        ("country" = Option<String>, Query, description = "Filter by contact country"),
    ),
    responses(
        (status = 200, description = "Entities retrieved successfully", body = ApiResponse<Vec<NetworkEntityResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_network_entities(
    Query(query): Query<ListNetworkEntitiesQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NetworkEntityResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_network_entities function");
    debug!("Fetching network entities, country filter: {:?}", query.country);

    let mut select = network_entity::Entity::find();
    if let Some(country) = &query.country {
        select = select
            .join(JoinType::InnerJoin, network_entity::Relation::Contact.def())
            .filter(contact::Column::Country.eq(country.clone()));
    }

    let entities = match select.all(&state.db).await {
        Ok(entities) => entities,
        Err(db_error) => {
            error!("Failed to retrieve network entities: {}", db_error);
            return Err(internal_error());
        }
    };

    // One id -> supplier_id map for the whole network, so levels do not
    // degrade into a chain walk per row.
    let supplier_links = match supplier_links(&state.db).await {
        Ok(links) => links,
        Err(db_error) => {
            error!("Failed to load supplier links: {}", db_error);
            return Err(internal_error());
        }
    };

    let entity_count = entities.len();
    let mut responses = Vec::with_capacity(entity_count);
    for entity in entities {
        let level = network_entity::level_from_links(entity.supplier_id, &supplier_links);
        match entity_response(&state.db, level, entity).await {
            Ok(response) => responses.push(response),
            Err(db_error) => {
                error!("Failed to assemble entity response: {}", db_error);
                return Err(internal_error());
            }
        }
    }

    info!("Successfully retrieved {} network entities", entity_count);
    Ok(Json(ApiResponse {
        data: responses,
        message: "Network entities retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific network entity by id
#[utoipa::path(
    get,
    path = "/api/v1/network-entities/{entity_id}",
    tag = "network-entities",
    params(
        ("entity_id" = i32, Path, description = "Network entity ID"),
    ),
    responses(
        (status = 200, description = "Entity retrieved successfully", body = ApiResponse<NetworkEntityResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_network_entity(
    Path(entity_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NetworkEntityResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_network_entity function for entity_id: {}", entity_id);

    let entity = find_entity(&state, entity_id).await?;

    let level = match entity.hierarchy_level(&state.db).await {
        Ok(level) => level,
        Err(db_error) => {
            error!("Failed to derive level for entity {}: {}", entity_id, db_error);
            return Err(internal_error());
        }
    };

    match entity_response(&state.db, level, entity).await {
        Ok(response) => {
            info!("Successfully retrieved network entity {}", entity_id);
            Ok(Json(ApiResponse {
                data: response,
                message: "Network entity retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to assemble entity response for {}: {}", entity_id, db_error);
            Err(internal_error())
        }
    }
}

/// Create a network entity together with its contact and products
#[utoipa::path(
    post,
    path = "/api/v1/network-entities",
    tag = "network-entities",
    request_body = CreateNetworkEntityRequest,
    responses(
        (status = 201, description = "Entity created successfully", body = ApiResponse<NetworkEntityResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_network_entity(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Json(request): Json<CreateNetworkEntityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NetworkEntityResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_network_entity function");
    debug!(
        "User {} creating network entity with name: {}",
        current_user.email, request.name
    );

    if let Err(validation_errors) = request.validate() {
        warn!("Entity creation rejected by validation: {}", validation_errors);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from_validation(&validation_errors)),
        ));
    }

    if let Some(supplier_id) = request.supplier {
        require_supplier_exists(&state, supplier_id).await?;
    }

    // Entity, contact and products are written in one transaction; a
    // failure partway leaves no orphaned rows.
    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(db_error) => {
            error!("Failed to open transaction: {}", db_error);
            return Err(internal_error());
        }
    };

    let entity = match insert_entity_graph(&txn, &request).await {
        Ok(entity) => entity,
        Err(db_error) => {
            error!("Failed to create network entity '{}': {}", request.name, db_error);
            let _ = txn.rollback().await;
            return Err(internal_error());
        }
    };

    if let Err(db_error) = txn.commit().await {
        error!("Failed to commit entity creation: {}", db_error);
        return Err(internal_error());
    }

    let level = match entity.hierarchy_level(&state.db).await {
        Ok(level) => level,
        Err(db_error) => {
            error!("Failed to derive level for new entity: {}", db_error);
            return Err(internal_error());
        }
    };

    match entity_response(&state.db, level, entity).await {
        Ok(response) => {
            info!("Network entity created successfully with ID: {}", response.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: response,
                    message: "Network entity created successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(db_error) => {
            error!("Failed to assemble response for created entity: {}", db_error);
            Err(internal_error())
        }
    }
}

/// Update a network entity, overwriting its contact and upserting the
/// submitted products
#[utoipa::path(
    put,
    path = "/api/v1/network-entities/{entity_id}",
    tag = "network-entities",
    params(
        ("entity_id" = i32, Path, description = "Network entity ID"),
    ),
    request_body = UpdateNetworkEntityRequest,
    responses(
        (status = 200, description = "Entity updated successfully", body = ApiResponse<NetworkEntityResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_network_entity(
    Path(entity_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateNetworkEntityRequest>,
) -> Result<Json<ApiResponse<NetworkEntityResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_network_entity function for entity_id: {}", entity_id);

    if let Err(validation_errors) = request.validate() {
        warn!("Entity update rejected by validation: {}", validation_errors);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::from_validation(&validation_errors)),
        ));
    }

    let entity = find_entity(&state, entity_id).await?;

    if let Some(supplier_id) = request.supplier {
        require_supplier_exists(&state, supplier_id).await?;
    }

    // Every submitted product id must belong to this entity before any
    // write happens.
    for product_data in &request.products {
        let Some(product_id) = product_data.id else {
            continue;
        };
        match product::Entity::find_by_id(product_id).one(&state.db).await {
            Ok(Some(existing)) if existing.network_entity_id == entity.id => {}
            Ok(_) => {
                warn!(
                    "Update of entity {} referenced foreign or unknown product {}",
                    entity_id, product_id
                );
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::field(
                        "products",
                        format!("Product {product_id} does not belong to this entity"),
                    )),
                ));
            }
            Err(db_error) => {
                error!("Failed to look up product {}: {}", product_id, db_error);
                return Err(internal_error());
            }
        }
    }

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(db_error) => {
            error!("Failed to open transaction: {}", db_error);
            return Err(internal_error());
        }
    };

    let entity = match apply_entity_update(&txn, entity, &request).await {
        Ok(entity) => entity,
        Err(db_error) => {
            error!("Failed to update network entity {}: {}", entity_id, db_error);
            let _ = txn.rollback().await;
            return Err(internal_error());
        }
    };

    if let Err(db_error) = txn.commit().await {
        error!("Failed to commit entity update: {}", db_error);
        return Err(internal_error());
    }

    let level = match entity.hierarchy_level(&state.db).await {
        Ok(level) => level,
        Err(db_error) => {
            error!("Failed to derive level for entity {}: {}", entity_id, db_error);
            return Err(internal_error());
        }
    };

    match entity_response(&state.db, level, entity).await {
        Ok(response) => {
            info!("Network entity {} updated successfully", entity_id);
            Ok(Json(ApiResponse {
                data: response,
                message: "Network entity updated successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to assemble response for entity {}: {}", entity_id, db_error);
            Err(internal_error())
        }
    }
}

/// Delete a network entity. Its contact and products cascade away; entities
/// supplied by it keep existing with their supplier link set to null.
#[utoipa::path(
    delete,
    path = "/api/v1/network-entities/{entity_id}",
    tag = "network-entities",
    params(
        ("entity_id" = i32, Path, description = "Network entity ID"),
    ),
    responses(
        (status = 200, description = "Entity deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_network_entity(
    Path(entity_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_network_entity function for entity_id: {}", entity_id);

    match network_entity::Entity::delete_by_id(entity_id).exec(&state.db).await {
        Ok(delete_result) => {
            debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);
            if delete_result.rows_affected > 0 {
                info!("Network entity {} deleted successfully", entity_id);
                Ok(Json(ApiResponse {
                    data: format!("Network entity {} deleted", entity_id),
                    message: "Network entity deleted successfully".to_string(),
                    success: true,
                }))
            } else {
                warn!("Network entity {} not found for deletion", entity_id);
                Err((
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::new("NOT_FOUND", "Network entity not found")),
                ))
            }
        }
        Err(db_error) => {
            error!("Failed to delete network entity {}: {}", entity_id, db_error);
            Err(internal_error())
        }
    }
}

async fn find_entity(
    state: &AppState,
    entity_id: i32,
) -> Result<network_entity::Model, (StatusCode, Json<ErrorResponse>)> {
    match network_entity::Entity::find_by_id(entity_id).one(&state.db).await {
        Ok(Some(entity)) => Ok(entity),
        Ok(None) => {
            warn!("Network entity {} not found", entity_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NOT_FOUND", "Network entity not found")),
            ))
        }
        Err(db_error) => {
            error!("Failed to retrieve network entity {}: {}", entity_id, db_error);
            Err(internal_error())
        }
    }
}

async fn require_supplier_exists(
    state: &AppState,
    supplier_id: i32,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    match network_entity::Entity::find_by_id(supplier_id).one(&state.db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Referenced supplier {} does not exist", supplier_id);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::field(
                    "supplier",
                    format!("Supplier {supplier_id} does not exist"),
                )),
            ))
        }
        Err(db_error) => {
            error!("Failed to look up supplier {}: {}", supplier_id, db_error);
            Err(internal_error())
        }
    }
}

/// id -> supplier_id for every entity in the network
async fn supplier_links(
    db: &(impl ConnectionTrait + Sync),
) -> Result<HashMap<i32, Option<i32>>, DbErr> {
    let links: Vec<(i32, Option<i32>)> = network_entity::Entity::find()
        .select_only()
        .column(network_entity::Column::Id)
        .column(network_entity::Column::SupplierId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(links.into_iter().collect())
}

async fn insert_entity_graph(
    txn: &DatabaseTransaction,
    request: &CreateNetworkEntityRequest,
) -> Result<network_entity::Model, DbErr> {
    let entity = network_entity::ActiveModel {
        name: Set(request.name.clone()),
        supplier_id: Set(request.supplier),
        debt: Set(Decimal::ZERO),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    contact::ActiveModel {
        network_entity_id: Set(entity.id),
        email: Set(request.contact.email.clone()),
        country: Set(request.contact.country.clone()),
        city: Set(request.contact.city.clone()),
        street: Set(request.contact.street.clone()),
        house_number: Set(request.contact.house_number.clone()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for product_data in &request.products {
        product::ActiveModel {
            network_entity_id: Set(entity.id),
            name: Set(product_data.name.clone()),
            model: Set(product_data.model.clone()),
            release_date: Set(product_data.release_date),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    Ok(entity)
}

async fn apply_entity_update(
    txn: &DatabaseTransaction,
    entity: network_entity::Model,
    request: &UpdateNetworkEntityRequest,
) -> Result<network_entity::Model, DbErr> {
    let entity = if request.name.is_some() || request.supplier.is_some() {
        let mut entity_active: network_entity::ActiveModel = entity.into();
        if let Some(name) = &request.name {
            entity_active.name = Set(name.clone());
        }
        if let Some(supplier_id) = request.supplier {
            entity_active.supplier_id = Set(Some(supplier_id));
        }
        entity_active.update(txn).await?
    } else {
        entity
    };

    if let Some(contact_data) = &request.contact {
        match entity.find_related(contact::Entity).one(txn).await? {
            Some(existing) => {
                let mut contact_active: contact::ActiveModel = existing.into();
                contact_active.email = Set(contact_data.email.clone());
                contact_active.country = Set(contact_data.country.clone());
                contact_active.city = Set(contact_data.city.clone());
                contact_active.street = Set(contact_data.street.clone());
                contact_active.house_number = Set(contact_data.house_number.clone());
                contact_active.update(txn).await?;
            }
            None => {
                contact::ActiveModel {
                    network_entity_id: Set(entity.id),
                    email: Set(contact_data.email.clone()),
                    country: Set(contact_data.country.clone()),
                    city: Set(contact_data.city.clone()),
                    street: Set(contact_data.street.clone()),
                    house_number: Set(contact_data.house_number.clone()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
    }

    for product_data in &request.products {
        match product_data.id {
            Some(product_id) => {
                // Existence and ownership were checked before the transaction
                let existing = product::Entity::find_by_id(product_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| DbErr::RecordNotFound(format!("product {product_id}")))?;
                let mut product_active: product::ActiveModel = existing.into();
                product_active.name = Set(product_data.name.clone());
                product_active.model = Set(product_data.model.clone());
                product_active.release_date = Set(product_data.release_date);
                product_active.update(txn).await?;
            }
            None => {
                product::ActiveModel {
                    network_entity_id: Set(entity.id),
                    name: Set(product_data.name.clone()),
                    model: Set(product_data.model.clone()),
                    release_date: Set(product_data.release_date),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
    }

    Ok(entity)
}

pub(crate) fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("INTERNAL_ERROR", "Internal server error")),
    )
}
