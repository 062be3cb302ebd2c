use crate::{
    entities::location::{self, LocationType},
    errors::ServiceError,
    handlers::{
        common::{created_response, message_response, success_response, ValidatedJson},
        AppState,
    },
    services::{
        locations::{CreateLocationInput, LocationFilter, LocationSearch, UpdateLocationInput},
        stock::StockSummaryRow,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<location::Model> for LocationResponse {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            location_type: model.location_type,
            address: model.address,
            city: model.city,
            country: model.country,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn to_responses(models: Vec<location::Model>) -> Vec<LocationResponse> {
    models.into_iter().map(LocationResponse::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/locations",
    params(LocationFilter),
    responses(
        (status = 200, description = "Locations ordered by type and name", body = [LocationResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(filter): Query<LocationFilter>,
) -> Result<Response, ServiceError> {
    let locations = state.services.locations.list_locations(filter).await?;
    Ok(success_response(to_responses(locations)))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocationInput,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Active location with this name exists", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateLocationInput>,
) -> Result<Response, ServiceError> {
    let location = state.services.locations.create_location(payload).await?;
    Ok(created_response(LocationResponse::from(location)))
}

#[utoipa::path(
    get,
    path = "/api/locations/search",
    params(LocationSearch),
    responses(
        (status = 200, description = "Matching active locations", body = [LocationResponse])
    ),
    tag = "locations"
)]
pub async fn search_locations(
    State(state): State<AppState>,
    Query(search): Query<LocationSearch>,
) -> Result<Response, ServiceError> {
    let locations = state.services.locations.search_locations(search).await?;
    Ok(success_response(to_responses(locations)))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location returned", body = LocationResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let location = state.services.locations.get_location(id).await?;
    Ok(success_response(LocationResponse::from(location)))
}

#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    params(("id" = Uuid, Path, description = "Location ID")),
    request_body = UpdateLocationInput,
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Active location with this name exists", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateLocationInput>,
) -> Result<Response, ServiceError> {
    let location = state.services.locations.update_location(id, payload).await?;
    Ok(success_response(LocationResponse::from(location)))
}

#[utoipa::path(
    post,
    path = "/api/locations/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location deactivated", body = LocationResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn deactivate_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let location = state.services.locations.deactivate_location(id).await?;
    Ok(success_response(LocationResponse::from(location)))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Inventory items still reference the location", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.locations.delete_location(id).await?;
    Ok(message_response(format!("Location {} deleted", id)))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}/inventory-summary",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Stock held at the location", body = [StockSummaryRow]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn location_inventory_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let rows = state.services.stock.location_summary(id).await?;
    Ok(success_response(rows))
}
