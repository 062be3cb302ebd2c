//! Multi-location inventory core for a fashion storefront: a location registry,
//! a variant catalog, a per-unit item ledger, stock aggregation and transfers.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Extension, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};
use crate::events::EventSender;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Successful outcome that carries only a message, e.g. after a delete.
    pub fn message(message: String) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Inventory API routes, each group gated by its permission.
pub fn api_routes() -> Router<AppState> {
    let locations_read = Router::new()
        .route("/locations", get(handlers::locations::list_locations))
        .route(
            "/locations/search",
            get(handlers::locations::search_locations),
        )
        .route("/locations/:id", get(handlers::locations::get_location))
        .route(
            "/locations/:id/inventory-summary",
            get(handlers::locations::location_inventory_summary),
        )
        .with_permission(perm::INVENTORY_READ);

    let locations_adjust = Router::new()
        .route("/locations", post(handlers::locations::create_location))
        .route(
            "/locations/:id",
            put(handlers::locations::update_location)
                .delete(handlers::locations::delete_location),
        )
        .route(
            "/locations/:id/deactivate",
            post(handlers::locations::deactivate_location),
        )
        .with_permission(perm::INVENTORY_ADJUST);

    let variants_read = Router::new()
        .route("/variants", get(handlers::variants::list_variants))
        .route("/variants/search", get(handlers::variants::search_variants))
        .route(
            "/variants/with-inventory",
            get(handlers::variants::list_variants_with_inventory),
        )
        .route(
            "/variants/sku-suggestion",
            get(handlers::variants::suggest_sku),
        )
        .route("/variants/:id", get(handlers::variants::get_variant))
        .with_permission(perm::INVENTORY_READ);

    let variants_adjust = Router::new()
        .route("/variants", post(handlers::variants::create_variant))
        .route(
            "/variants/:id",
            put(handlers::variants::update_variant).delete(handlers::variants::delete_variant),
        )
        .route(
            "/variants/:id/deactivate",
            post(handlers::variants::deactivate_variant),
        )
        .with_permission(perm::INVENTORY_ADJUST);

    let products_read = Router::new()
        .route("/products/:id", get(handlers::products::get_product))
        .route(
            "/products/:id/variants",
            get(handlers::products::list_product_variants),
        )
        .route("/products/:id/stock", get(handlers::products::product_stock))
        .route(
            "/products/:id/filter-variants",
            post(handlers::products::filter_product_variants),
        )
        .with_permission(perm::INVENTORY_READ);

    let products_adjust = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/:id/legacy-stock",
            put(handlers::products::set_legacy_stock),
        )
        .with_permission(perm::INVENTORY_ADJUST);

    let inventory_read = Router::new()
        .route("/inventory/items", get(handlers::inventory::list_items))
        .route("/inventory/items/:id", get(handlers::inventory::get_item))
        .route(
            "/inventory/items/:id/transactions",
            get(handlers::inventory::item_transactions),
        )
        .route(
            "/inventory/summary",
            get(handlers::inventory::inventory_summary),
        )
        .route("/inventory/low-stock", get(handlers::inventory::low_stock))
        .with_permission(perm::INVENTORY_READ);

    let inventory_adjust = Router::new()
        .route("/inventory/items", post(handlers::inventory::add_items))
        .route(
            "/inventory/items/:id/status",
            put(handlers::inventory::set_item_status),
        )
        .route(
            "/inventory/items/:id/condition",
            put(handlers::inventory::set_item_condition),
        )
        .with_permission(perm::INVENTORY_ADJUST);

    let inventory_transfer = Router::new()
        .route(
            "/inventory/transfer",
            post(handlers::inventory::transfer_stock),
        )
        .with_permission(perm::INVENTORY_TRANSFER);

    Router::new()
        .merge(locations_read)
        .merge(locations_adjust)
        .merge(variants_read)
        .merge(variants_adjust)
        .merge(products_read)
        .merge(products_adjust)
        .merge(inventory_read)
        .merge(inventory_adjust)
        .merge(inventory_transfer)
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            environment = %cfg.environment,
            "Using permissive CORS because explicit origins were not configured"
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full HTTP application: health, OpenAPI, and the `/api` routes with the
/// shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let auth = state.auth.clone();

    Router::<AppState>::new()
        .route("/", get(|| async { "atelier-inventory up" }))
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        // Auth middleware resolves the AuthService from request extensions
        .layer(Extension(auth))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
