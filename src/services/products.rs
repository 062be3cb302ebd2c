use crate::{
    db::DbPool,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{optional_text, required_text, validate_money},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Input for seeding a storefront product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "49.00")]
    pub base_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub reserved_quantity: i32,
}

/// Flat counters for products without variants
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct LegacyStockInput {
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub reserved_quantity: i32,
}

/// Service for the slice of the product catalog the inventory core reads
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let name = required_text("name", &input.name)?;
        validate_money("base_price", input.base_price)?;
        check_counters(input.quantity, input.reserved_quantity)?;

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(optional_text(input.description)),
            base_price: Set(input.base_price),
            quantity: Set(input.quantity),
            reserved_quantity: Set(input.reserved_quantity),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Overwrite the flat quantity/reserved_quantity pair
    #[instrument(skip(self))]
    pub async fn set_legacy_stock(
        &self,
        id: Uuid,
        input: LegacyStockInput,
    ) -> Result<product::Model, ServiceError> {
        check_counters(input.quantity, input.reserved_quantity)?;

        let existing = self.get_product(id).await?;
        let mut active: product::ActiveModel = existing.into();
        active.quantity = Set(input.quantity);
        active.reserved_quantity = Set(input.reserved_quantity);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::LegacyStockUpdated {
                product_id: id,
                quantity: updated.quantity,
                reserved_quantity: updated.reserved_quantity,
            })
            .await;

        info!(
            product_id = %id,
            quantity = updated.quantity,
            reserved_quantity = updated.reserved_quantity,
            "Legacy stock updated"
        );
        Ok(updated)
    }
}

fn check_counters(quantity: i32, reserved_quantity: i32) -> Result<(), ServiceError> {
    if quantity < 0 || reserved_quantity < 0 {
        return Err(ServiceError::ValidationError(
            "quantity and reserved_quantity must not be negative".to_string(),
        ));
    }
    Ok(())
}
