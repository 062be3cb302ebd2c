use crate::{
    auth::AuthUser,
    entities::{
        inventory_item::{self, ItemCondition, ItemStatus},
        inventory_transaction::{self, TransactionType},
    },
    errors::ServiceError,
    handlers::{
        common::{created_response, success_response, ValidatedJson},
        AppState,
    },
    services::{
        ledger::{AddItemsInput, ItemQuery, SetConditionInput, SetStatusInput},
        stock::{LowStockRow, StockFilter, StockSummaryRow},
        transfers::{TransferRequest, TransferResult},
    },
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub location_id: Uuid,
    pub status: ItemStatus,
    pub condition: ItemCondition,
    #[schema(value_type = Option<String>, example = "12.50")]
    pub purchase_cost: Option<Decimal>,
    pub supplier_batch: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_item::Model> for InventoryItemResponse {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            id: model.id,
            variant_id: model.variant_id,
            location_id: model.location_id,
            status: model.status,
            condition: model.condition,
            purchase_cost: model.purchase_cost,
            supplier_batch: model.supplier_batch,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddItemsResponse {
    pub created_count: usize,
    pub items: Vec<InventoryItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryTransactionResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub transaction_type: TransactionType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_transaction::Model> for InventoryTransactionResponse {
    fn from(model: inventory_transaction::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            transaction_type: model.transaction_type,
            from_location_id: model.from_location_id,
            to_location_id: model.to_location_id,
            previous_value: model.previous_value,
            new_value: model.new_value,
            notes: model.notes,
            performed_by: model.performed_by,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Available count below which a pair is reported; server default when absent
    pub threshold: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/inventory/items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Items oldest first", body = [InventoryItemResponse])
    ),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<Response, ServiceError> {
    let items = state.services.ledger.query_items(query).await?;
    let body: Vec<InventoryItemResponse> =
        items.into_iter().map(InventoryItemResponse::from).collect();
    Ok(success_response(body))
}

#[utoipa::path(
    post,
    path = "/api/inventory/items",
    request_body = AddItemsInput,
    responses(
        (status = 201, description = "Units received", body = AddItemsResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AddItemsInput>,
) -> Result<Response, ServiceError> {
    let items = state
        .services
        .ledger
        .add_items(payload, Some(user.actor()))
        .await?;
    Ok(created_response(AddItemsResponse {
        created_count: items.len(),
        items: items.into_iter().map(InventoryItemResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Item returned", body = InventoryItemResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let item = state.services.ledger.get_item(id).await?;
    Ok(success_response(InventoryItemResponse::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/items/{id}/status",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    request_body = SetStatusInput,
    responses(
        (status = 200, description = "Status changed", body = InventoryItemResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn set_item_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<SetStatusInput>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .ledger
        .set_status(id, payload.status, payload.notes, Some(user.actor()))
        .await?;
    Ok(success_response(InventoryItemResponse::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/items/{id}/condition",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    request_body = SetConditionInput,
    responses(
        (status = 200, description = "Condition changed", body = InventoryItemResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item already sold", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn set_item_condition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<SetConditionInput>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .ledger
        .set_condition(id, payload.condition, payload.notes, Some(user.actor()))
        .await?;
    Ok(success_response(InventoryItemResponse::from(item)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}/transactions",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Movement log, newest first", body = [InventoryTransactionResponse]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn item_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let history = state.services.ledger.item_history(id).await?;
    let body: Vec<InventoryTransactionResponse> = history
        .into_iter()
        .map(InventoryTransactionResponse::from)
        .collect();
    Ok(success_response(body))
}

#[utoipa::path(
    get,
    path = "/api/inventory/summary",
    params(StockFilter),
    responses(
        (status = 200, description = "Counts per variant and location", body = [StockSummaryRow])
    ),
    tag = "inventory"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
    Query(filter): Query<StockFilter>,
) -> Result<Response, ServiceError> {
    let rows = state.services.stock.summary(filter).await?;
    Ok(success_response(rows))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Pairs below the threshold", body = [LowStockRow]),
        (status = 400, description = "Negative threshold", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Response, ServiceError> {
    let rows = state.services.stock.low_stock(query.threshold).await?;
    Ok(success_response(rows))
}

#[utoipa::path(
    post,
    path = "/api/inventory/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Units moved", body = TransferResult),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough available units at the source", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<TransferRequest>,
) -> Result<Response, ServiceError> {
    let result = state
        .services
        .transfers
        .transfer(payload, Some(user.actor()))
        .await?;
    Ok(success_response(result))
}
