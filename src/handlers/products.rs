use crate::{
    entities::product,
    errors::ServiceError,
    handlers::{
        common::{created_response, success_response, ValidatedJson},
        variants::{to_responses, to_stock_responses, VariantResponse, VariantStockResponse},
        AppState,
    },
    services::{
        products::{CreateProductInput, LegacyStockInput},
        stock::ProductStock,
        variants::AttributeFilterInput,
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
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "49.00")]
    pub base_price: Decimal,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            base_price: model.base_price,
            quantity: model.quantity,
            reserved_quantity: model.reserved_quantity,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductVariantsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProductInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok(created_response(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = ProductResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product ID"), ProductVariantsQuery),
    responses(
        (status = 200, description = "Variants of the product", body = [VariantResponse]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_product_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProductVariantsQuery>,
) -> Result<Response, ServiceError> {
    let variants = state
        .services
        .variants
        .list_product_variants(id, query.include_inactive)
        .await?;
    Ok(success_response(to_responses(variants)))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/filter-variants",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = AttributeFilterInput,
    responses(
        (status = 200, description = "Active variants carrying every requested attribute value", body = [VariantStockResponse]),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn filter_product_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AttributeFilterInput>,
) -> Result<Response, ServiceError> {
    let variants = state
        .services
        .variants
        .filter_variants_by_attributes(id, payload)
        .await?;
    Ok(success_response(to_stock_responses(variants)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/legacy-stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = LegacyStockInput,
    responses(
        (status = 200, description = "Flat counters updated", body = ProductResponse),
        (status = 400, description = "Negative counters", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn set_legacy_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<LegacyStockInput>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.set_legacy_stock(id, payload).await?;
    Ok(success_response(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Sellable units across all variants and locations", body = ProductStock),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn product_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let stock = state.services.stock.product_total_stock(id).await?;
    Ok(success_response(stock))
}
