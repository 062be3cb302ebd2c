use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as InventoryItem},
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        required_text,
        stock::{tally_by_variant, StatusTally},
        validate_money,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVariantInput {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub variant_name: String,
    #[validate(length(min = 1, max = 100))]
    pub variant_sku: String,
    #[schema(value_type = String, example = "59.90")]
    pub variant_price: Decimal,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVariantInput {
    #[validate(length(min = 1, max = 255))]
    pub variant_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub variant_sku: Option<String>,
    #[schema(value_type = Option<String>, example = "64.90")]
    pub variant_price: Option<Decimal>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VariantFilter {
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SkuSuggestionQuery {
    /// Product type code, e.g. `TS`
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Variant joined with the name of its product
#[derive(Debug, Clone, PartialEq)]
pub struct VariantWithProduct {
    pub variant: product_variant::Model,
    pub product_name: String,
}

/// Variant with its stock summed over every location
#[derive(Debug, Clone, PartialEq)]
pub struct VariantWithStock {
    pub variant: VariantWithProduct,
    pub stock: StatusTally,
}

/// Attribute values a variant must carry, e.g. `{"color": "black", "size": "m"}`
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AttributeFilterInput {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SkuSuggestion {
    pub sku: String,
    /// Whether some variant already uses the suggested SKU
    pub taken: bool,
}

/// Builds a `TYPE-COLOR-SIZE` style SKU from whichever segments are present.
pub fn build_sku_suggestion(segments: &[Option<&str>]) -> Option<String> {
    let parts: Vec<String> = segments
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join("").to_uppercase())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("-"))
    }
}

/// Whether `attributes` carries every wanted key with the wanted value.
///
/// Keys and values compare trimmed and case-insensitively; numbers and
/// booleans match their textual form. An empty filter matches everything.
pub fn attributes_match(attributes: Option<&Value>, wanted: &BTreeMap<String, String>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let Some(Value::Object(map)) = attributes else {
        return false;
    };

    wanted.iter().all(|(key, expected)| {
        let key = key.trim();
        let expected = expected.trim();
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .and_then(|(_, value)| match value {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
    })
}

/// Variant catalog
pub struct VariantService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl VariantService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(sku = %input.variant_sku))]
    pub async fn create_variant(
        &self,
        input: CreateVariantInput,
    ) -> Result<VariantWithProduct, ServiceError> {
        let variant_name = required_text("variant_name", &input.variant_name)?;
        let variant_sku = required_text("variant_sku", &input.variant_sku)?;
        validate_money("variant_price", input.variant_price)?;
        check_attributes(input.attributes.as_ref())?;

        let txn = self.db_pool.begin().await?;
        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    input.product_id
                ))
            })?;
        ensure_sku_free(&txn, &variant_sku, None).await?;

        let now = Utc::now();
        let variant = product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            variant_name: Set(variant_name),
            variant_sku: Set(variant_sku.clone()),
            variant_price: Set(input.variant_price),
            attributes: Set(input.attributes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| sku_conflict(e, &variant_sku))?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::VariantCreated {
                variant_id: variant.id,
                product_id: product.id,
                sku: variant.variant_sku.clone(),
            })
            .await;
        info!(variant_id = %variant.id, product_id = %product.id, "Variant created");

        Ok(VariantWithProduct {
            variant,
            product_name: product.name,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update_variant(
        &self,
        id: Uuid,
        input: UpdateVariantInput,
    ) -> Result<VariantWithProduct, ServiceError> {
        check_attributes(input.attributes.as_ref())?;
        if let Some(price) = input.variant_price {
            validate_money("variant_price", price)?;
        }

        let txn = self.db_pool.begin().await?;
        let existing = ProductVariant::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {} not found", id)))?;

        let mut active: product_variant::ActiveModel = existing.clone().into();
        if let Some(name) = input.variant_name.as_deref() {
            active.variant_name = Set(required_text("variant_name", name)?);
        }
        if let Some(sku) = input.variant_sku.as_deref() {
            let sku = required_text("variant_sku", sku)?;
            if sku != existing.variant_sku {
                ensure_sku_free(&txn, &sku, Some(id)).await?;
            }
            active.variant_sku = Set(sku);
        }
        if let Some(price) = input.variant_price {
            active.variant_price = Set(price);
        }
        if input.attributes.is_some() {
            active.attributes = Set(input.attributes);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let attempted_sku = input
            .variant_sku
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.variant_sku)
            .to_string();
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| sku_conflict(e, &attempted_sku))?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::VariantUpdated(id))
            .await;
        info!(variant_id = %id, "Variant updated");

        let product_name = self.product_name(updated.product_id).await?;
        Ok(VariantWithProduct {
            variant: updated,
            product_name,
        })
    }

    /// Hard delete, refused while inventory items reference the variant
    #[instrument(skip(self))]
    pub async fn delete_variant(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = ProductVariant::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {} not found", id)))?;

        let referencing = InventoryItem::find()
            .filter(inventory_item::Column::VariantId.eq(id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            warn!(variant_id = %id, items = referencing, "Refusing to delete referenced variant");
            return Err(ServiceError::ReferentialIntegrity(format!(
                "Variant '{}' has {} inventory item(s); deactivate it instead",
                existing.variant_sku, referencing
            )));
        }

        existing.delete(&txn).await.map_err(|e| {
            ServiceError::referential_on_fk(e, format!("Variant {} is still referenced", id))
        })?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::VariantDeleted(id))
            .await;
        info!(variant_id = %id, "Variant deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn deactivate_variant(&self, id: Uuid) -> Result<VariantWithProduct, ServiceError> {
        let existing = self.get_variant(id).await?;
        if !existing.variant.is_active {
            return Ok(existing);
        }

        let mut active: product_variant::ActiveModel = existing.variant.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let variant = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::VariantDeactivated(id))
            .await;
        info!(variant_id = %id, "Variant deactivated");
        Ok(VariantWithProduct {
            variant,
            product_name: existing.product_name,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_variant(&self, id: Uuid) -> Result<VariantWithProduct, ServiceError> {
        let (variant, product) = ProductVariant::find_by_id(id)
            .find_also_related(Product)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {} not found", id)))?;

        Ok(VariantWithProduct {
            variant,
            product_name: product.map(|p| p.name).unwrap_or_default(),
        })
    }

    /// Variants ordered by product name, then variant name
    #[instrument(skip(self))]
    pub async fn list_variants(
        &self,
        filter: VariantFilter,
    ) -> Result<Vec<VariantWithProduct>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(product_id) = filter.product_id {
            condition = condition.add(product_variant::Column::ProductId.eq(product_id));
        }
        if !filter.include_inactive {
            condition = condition.add(product_variant::Column::IsActive.eq(true));
        }
        self.find_joined(condition).await
    }

    /// Variants of one product; unknown products are a `NotFound`
    #[instrument(skip(self))]
    pub async fn list_product_variants(
        &self,
        product_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<VariantWithProduct>, ServiceError> {
        if Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        self.list_variants(VariantFilter {
            product_id: Some(product_id),
            include_inactive,
        })
        .await
    }

    /// Variants with stock counts across all locations; unstocked variants report zeros
    #[instrument(skip(self))]
    pub async fn list_variants_with_stock(
        &self,
        filter: VariantFilter,
    ) -> Result<Vec<VariantWithStock>, ServiceError> {
        let variants = self.list_variants(filter).await?;
        self.attach_stock(variants).await
    }

    /// Active variants of a product carrying every requested attribute value
    #[instrument(skip(self, input))]
    pub async fn filter_variants_by_attributes(
        &self,
        product_id: Uuid,
        input: AttributeFilterInput,
    ) -> Result<Vec<VariantWithStock>, ServiceError> {
        let variants: Vec<VariantWithProduct> = self
            .list_product_variants(product_id, false)
            .await?
            .into_iter()
            .filter(|v| attributes_match(v.variant.attributes.as_ref(), &input.attributes))
            .collect();
        self.attach_stock(variants).await
    }

    /// Active variants whose name or SKU contains `q`
    #[instrument(skip(self))]
    pub async fn search_variants(&self, q: &str) -> Result<Vec<VariantWithProduct>, ServiceError> {
        let q = required_text("q", q)?;
        let condition = Condition::all()
            .add(product_variant::Column::IsActive.eq(true))
            .add(
                Condition::any()
                    .add(product_variant::Column::VariantName.contains(&q))
                    .add(product_variant::Column::VariantSku.contains(&q)),
            );
        self.find_joined(condition).await
    }

    #[instrument(skip(self))]
    pub async fn suggest_sku(&self, query: SkuSuggestionQuery) -> Result<SkuSuggestion, ServiceError> {
        let sku = build_sku_suggestion(&[
            query.product_type.as_deref(),
            query.color.as_deref(),
            query.size.as_deref(),
        ])
        .ok_or_else(|| {
            ServiceError::ValidationError(
                "at least one of type, color or size is required".to_string(),
            )
        })?;

        let taken = ProductVariant::find()
            .filter(product_variant::Column::VariantSku.eq(sku.as_str()))
            .count(&*self.db_pool)
            .await?
            > 0;

        Ok(SkuSuggestion { sku, taken })
    }

    async fn find_joined(
        &self,
        condition: Condition,
    ) -> Result<Vec<VariantWithProduct>, ServiceError> {
        let rows = ProductVariant::find()
            .filter(condition)
            .find_also_related(Product)
            .order_by_asc(product::Column::Name)
            .order_by_asc(product_variant::Column::VariantName)
            .order_by_asc(product_variant::Column::Id)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(variant, product)| VariantWithProduct {
                variant,
                product_name: product.map(|p| p.name).unwrap_or_default(),
            })
            .collect())
    }

    async fn attach_stock(
        &self,
        variants: Vec<VariantWithProduct>,
    ) -> Result<Vec<VariantWithStock>, ServiceError> {
        let ids: Vec<Uuid> = variants.iter().map(|v| v.variant.id).collect();
        let tallies = tally_by_variant(&*self.db_pool, &ids).await?;

        Ok(variants
            .into_iter()
            .map(|variant| VariantWithStock {
                stock: tallies
                    .get(&variant.variant.id)
                    .copied()
                    .unwrap_or_default(),
                variant,
            })
            .collect())
    }

    async fn product_name(&self, product_id: Uuid) -> Result<String, ServiceError> {
        Ok(Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .map(|p| p.name)
            .unwrap_or_default())
    }
}

async fn ensure_sku_free<C: ConnectionTrait>(
    db: &C,
    sku: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = ProductVariant::find().filter(product_variant::Column::VariantSku.eq(sku));
    if let Some(id) = exclude {
        query = query.filter(product_variant::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        warn!(sku = %sku, "Duplicate SKU rejected");
        return Err(ServiceError::Conflict(format!(
            "SKU '{}' is already in use",
            sku
        )));
    }
    Ok(())
}

fn sku_conflict(error: sea_orm::DbErr, sku: &str) -> ServiceError {
    ServiceError::conflict_on_unique(error, format!("SKU '{}' is already in use", sku))
}

fn check_attributes(attributes: Option<&serde_json::Value>) -> Result<(), ServiceError> {
    match attributes {
        None | Some(serde_json::Value::Object(_)) => Ok(()),
        Some(_) => Err(ServiceError::ValidationError(
            "attributes must be a JSON object".to_string(),
        )),
    }
}
