use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier Inventory API",
        version = "0.1.0",
        description = r#"
# Atelier Inventory

Multi-location stock tracking for the storefront and back office.

- **Locations**: warehouses, stores, online fulfilment and suppliers
- **Variants**: purchasable color/size configurations with a globally unique SKU
- **Ledger**: one row per physical unit, with status, condition and provenance
- **Aggregation**: available/reserved/sold counts per variant and location
- **Transfers**: all-or-nothing moves of the oldest available units

## Authentication

Every `/api` route requires a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

Reads need `inventory:read`, catalog and ledger changes `inventory:adjust`,
transfers `inventory:transfer`. The `admin` role bypasses these checks.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "locations", description = "Location registry"),
        (name = "variants", description = "Variant catalog"),
        (name = "products", description = "Storefront products and product-level stock"),
        (name = "inventory", description = "Item ledger, aggregation and transfers"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Locations
        crate::handlers::locations::list_locations,
        crate::handlers::locations::create_location,
        crate::handlers::locations::search_locations,
        crate::handlers::locations::get_location,
        crate::handlers::locations::update_location,
        crate::handlers::locations::deactivate_location,
        crate::handlers::locations::delete_location,
        crate::handlers::locations::location_inventory_summary,

        // Variants
        crate::handlers::variants::list_variants,
        crate::handlers::variants::list_variants_with_inventory,
        crate::handlers::variants::create_variant,
        crate::handlers::variants::search_variants,
        crate::handlers::variants::suggest_sku,
        crate::handlers::variants::get_variant,
        crate::handlers::variants::update_variant,
        crate::handlers::variants::deactivate_variant,
        crate::handlers::variants::delete_variant,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::list_product_variants,
        crate::handlers::products::filter_product_variants,
        crate::handlers::products::set_legacy_stock,
        crate::handlers::products::product_stock,

        // Inventory
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::add_items,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::set_item_status,
        crate::handlers::inventory::set_item_condition,
        crate::handlers::inventory::item_transactions,
        crate::handlers::inventory::inventory_summary,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::transfer_stock,

        // Health
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::ResponseMeta,
            crate::entities::location::LocationType,
            crate::entities::inventory_item::ItemStatus,
            crate::entities::inventory_item::ItemCondition,
            crate::entities::inventory_transaction::TransactionType,
            crate::services::stock::StockSeverity,
            crate::services::stock::StockSource,
        )
    ),
    modifiers(&SecurityAddon),
    security(("bearer_auth" = []))
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
