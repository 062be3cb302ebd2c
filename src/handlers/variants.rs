use crate::{
    errors::ServiceError,
    handlers::{
        common::{created_response, message_response, success_response, ValidatedJson},
        AppState,
    },
    services::variants::{
        CreateVariantInput, SkuSuggestion, SkuSuggestionQuery, UpdateVariantInput,
        VariantFilter, VariantWithProduct, VariantWithStock,
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

/// Variant joined with its product name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub variant_sku: String,
    #[schema(value_type = String, example = "59.90")]
    pub variant_price: Decimal,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VariantWithProduct> for VariantResponse {
    fn from(joined: VariantWithProduct) -> Self {
        let variant = joined.variant;
        Self {
            id: variant.id,
            product_id: variant.product_id,
            product_name: joined.product_name,
            variant_name: variant.variant_name,
            variant_sku: variant.variant_sku,
            variant_price: variant.variant_price,
            attributes: variant.attributes,
            is_active: variant.is_active,
            created_at: variant.created_at,
            updated_at: variant.updated_at,
        }
    }
}

pub(crate) fn to_responses(rows: Vec<VariantWithProduct>) -> Vec<VariantResponse> {
    rows.into_iter().map(VariantResponse::from).collect()
}

/// Variant with item counts summed over every location
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantStockResponse {
    #[serde(flatten)]
    pub variant: VariantResponse,
    pub total_items: i64,
    pub available_count: i64,
    pub reserved_count: i64,
    pub sold_count: i64,
}

impl From<VariantWithStock> for VariantStockResponse {
    fn from(row: VariantWithStock) -> Self {
        Self {
            total_items: row.stock.total(),
            available_count: row.stock.available,
            reserved_count: row.stock.reserved,
            sold_count: row.stock.sold,
            variant: VariantResponse::from(row.variant),
        }
    }
}

pub(crate) fn to_stock_responses(rows: Vec<VariantWithStock>) -> Vec<VariantStockResponse> {
    rows.into_iter().map(VariantStockResponse::from).collect()
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VariantSearchQuery {
    /// Substring of the variant name or SKU
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/variants",
    params(VariantFilter),
    responses(
        (status = 200, description = "Variants ordered by product and variant name", body = [VariantResponse])
    ),
    tag = "variants"
)]
pub async fn list_variants(
    State(state): State<AppState>,
    Query(filter): Query<VariantFilter>,
) -> Result<Response, ServiceError> {
    let variants = state.services.variants.list_variants(filter).await?;
    Ok(success_response(to_responses(variants)))
}

#[utoipa::path(
    get,
    path = "/api/variants/with-inventory",
    params(VariantFilter),
    responses(
        (status = 200, description = "Variants with stock across all locations, zeros when unstocked", body = [VariantStockResponse])
    ),
    tag = "variants"
)]
pub async fn list_variants_with_inventory(
    State(state): State<AppState>,
    Query(filter): Query<VariantFilter>,
) -> Result<Response, ServiceError> {
    let variants = state
        .services
        .variants
        .list_variants_with_stock(filter)
        .await?;
    Ok(success_response(to_stock_responses(variants)))
}

#[utoipa::path(
    post,
    path = "/api/variants",
    request_body = CreateVariantInput,
    responses(
        (status = 201, description = "Variant created", body = VariantResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn create_variant(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateVariantInput>,
) -> Result<Response, ServiceError> {
    let variant = state.services.variants.create_variant(payload).await?;
    Ok(created_response(VariantResponse::from(variant)))
}

#[utoipa::path(
    get,
    path = "/api/variants/search",
    params(VariantSearchQuery),
    responses(
        (status = 200, description = "Matching active variants", body = [VariantResponse]),
        (status = 400, description = "Blank query", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn search_variants(
    State(state): State<AppState>,
    Query(query): Query<VariantSearchQuery>,
) -> Result<Response, ServiceError> {
    let variants = state.services.variants.search_variants(&query.q).await?;
    Ok(success_response(to_responses(variants)))
}

#[utoipa::path(
    get,
    path = "/api/variants/sku-suggestion",
    params(SkuSuggestionQuery),
    responses(
        (status = 200, description = "Suggested TYPE-COLOR-SIZE SKU", body = SkuSuggestion),
        (status = 400, description = "No segments supplied", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn suggest_sku(
    State(state): State<AppState>,
    Query(query): Query<SkuSuggestionQuery>,
) -> Result<Response, ServiceError> {
    let suggestion = state.services.variants.suggest_sku(query).await?;
    Ok(success_response(suggestion))
}

#[utoipa::path(
    get,
    path = "/api/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant returned", body = VariantResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn get_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let variant = state.services.variants.get_variant(id).await?;
    Ok(success_response(VariantResponse::from(variant)))
}

#[utoipa::path(
    put,
    path = "/api/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    request_body = UpdateVariantInput,
    responses(
        (status = 200, description = "Variant updated", body = VariantResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn update_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateVariantInput>,
) -> Result<Response, ServiceError> {
    let variant = state.services.variants.update_variant(id, payload).await?;
    Ok(success_response(VariantResponse::from(variant)))
}

#[utoipa::path(
    post,
    path = "/api/variants/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant deactivated", body = VariantResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn deactivate_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let variant = state.services.variants.deactivate_variant(id).await?;
    Ok(success_response(VariantResponse::from(variant)))
}

#[utoipa::path(
    delete,
    path = "/api/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Inventory items still reference the variant", body = crate::errors::ErrorResponse)
    ),
    tag = "variants"
)]
pub async fn delete_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.variants.delete_variant(id).await?;
    Ok(message_response(format!("Variant {} deleted", id)))
}
