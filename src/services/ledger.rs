//! Inventory item ledger: one row per physical unit.
//!
//! Every mutation runs inside a single database transaction and writes a
//! matching row to `inventory_transactions`. Events are sent after commit.

use crate::{
    db::{self, DbPool},
    entities::{
        inventory_item::{self, Entity as InventoryItem, ItemCondition, ItemStatus},
        inventory_transaction::{self, Entity as InventoryTransaction, TransactionType},
        location::Entity as Location,
        product_variant::Entity as ProductVariant,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{optional_text, validate_money},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr,
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const MAX_ITEMS_PER_RECEIPT: i32 = 1000;
pub const DEFAULT_QUERY_LIMIT: u64 = 100;
pub const MAX_QUERY_LIMIT: u64 = 500;

/// Rows per multi-row INSERT, keeping well below bind-parameter limits.
const INSERT_CHUNK: usize = 200;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddItemsInput {
    pub variant_id: Uuid,
    pub location_id: Uuid,
    /// Number of units received, one row each. Defaults to 1.
    #[validate(range(min = 1, max = 1000))]
    pub quantity: Option<i32>,
    pub status: Option<ItemStatus>,
    pub condition: Option<ItemCondition>,
    #[schema(value_type = Option<String>, example = "12.50")]
    pub purchase_cost: Option<Decimal>,
    #[validate(length(max = 100))]
    pub supplier_batch: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetStatusInput {
    pub status: ItemStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetConditionInput {
    pub condition: ItemCondition,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    pub variant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[param(value_type = Option<String>, example = "available")]
    pub status: Option<ItemStatus>,
    #[param(value_type = Option<String>, example = "new")]
    pub condition: Option<ItemCondition>,
    /// Page size, default 100, capped at 500
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ItemQuery {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_QUERY_LIMIT)
            .clamp(1, MAX_QUERY_LIMIT)
    }
}

/// Service for receiving units and moving them through their lifecycle
pub struct LedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Receives `quantity` units as individual rows.
    #[instrument(skip(self, input), fields(variant_id = %input.variant_id, location_id = %input.location_id))]
    pub async fn add_items(
        &self,
        input: AddItemsInput,
        performed_by: Option<String>,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let quantity = input.quantity.unwrap_or(1);
        if !(1..=MAX_ITEMS_PER_RECEIPT).contains(&quantity) {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be between 1 and {}",
                MAX_ITEMS_PER_RECEIPT
            )));
        }
        if let Some(cost) = input.purchase_cost {
            validate_money("purchase_cost", cost)?;
        }

        let variant_id = input.variant_id;
        let location_id = input.location_id;
        let status = input.status.unwrap_or(ItemStatus::Available);
        let condition = input.condition.unwrap_or(ItemCondition::New);
        let purchase_cost = input.purchase_cost;
        let supplier_batch = optional_text(input.supplier_batch);
        let notes = optional_text(input.notes);

        let items = self
            .db_pool
            .transaction::<_, Vec<inventory_item::Model>, ServiceError>(move |txn| {
                Box::pin(async move {
                    ProductVariant::find_by_id(variant_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Variant {} does not exist",
                                variant_id
                            ))
                        })?;
                    let location = Location::find_by_id(location_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Location {} does not exist",
                                location_id
                            ))
                        })?;
                    if !location.is_active {
                        return Err(ServiceError::ValidationError(format!(
                            "Location '{}' is inactive",
                            location.name
                        )));
                    }

                    let now = Utc::now();
                    let items: Vec<inventory_item::Model> = (0..quantity)
                        .map(|_| inventory_item::Model {
                            id: Uuid::new_v4(),
                            variant_id,
                            location_id,
                            status,
                            condition,
                            purchase_cost,
                            supplier_batch: supplier_batch.clone(),
                            notes: notes.clone(),
                            created_at: now,
                            updated_at: now,
                        })
                        .collect();

                    for chunk in items.chunks(INSERT_CHUNK) {
                        InventoryItem::insert_many(chunk.iter().cloned().map(|item| {
                            inventory_item::ActiveModel::from(item)
                        }))
                        .exec_without_returning(txn)
                        .await?;

                        InventoryTransaction::insert_many(chunk.iter().map(|item| {
                            movement(
                                item.id,
                                TransactionType::Received,
                                None,
                                Some(location_id),
                                None,
                                Some(status.to_string()),
                                notes.clone(),
                                performed_by.clone(),
                            )
                        }))
                        .exec_without_returning(txn)
                        .await?;
                    }

                    Ok(items)
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        self.event_sender
            .send_or_log(Event::InventoryItemsAdded {
                variant_id,
                location_id,
                item_ids: items.iter().map(|item| item.id).collect(),
            })
            .await;
        info!(
            variant_id = %variant_id,
            location_id = %location_id,
            count = items.len(),
            "Inventory items received"
        );

        Ok(items)
    }

    /// Moves one item along available → reserved → sold (or back to available).
    #[instrument(skip(self, notes))]
    pub async fn set_status(
        &self,
        item_id: Uuid,
        new_status: ItemStatus,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> Result<inventory_item::Model, ServiceError> {
        let notes = optional_text(notes);

        let (previous, updated) = self
            .db_pool
            .transaction::<_, (ItemStatus, inventory_item::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = find_item_for_update(txn, item_id).await?;
                    let previous = item.status;

                    if !previous.can_transition_to(new_status) {
                        return Err(ServiceError::InvalidState(format!(
                            "Cannot change item status from {} to {}",
                            previous, new_status
                        )));
                    }

                    let now = Utc::now();
                    let result = InventoryItem::update_many()
                        .col_expr(inventory_item::Column::Status, Expr::value(new_status))
                        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(now))
                        .filter(inventory_item::Column::Id.eq(item_id))
                        .filter(inventory_item::Column::Status.eq(previous))
                        .exec(txn)
                        .await?;
                    if result.rows_affected != 1 {
                        return Err(ServiceError::InvalidState(format!(
                            "Item {} changed concurrently; retry",
                            item_id
                        )));
                    }

                    InventoryTransaction::insert(movement(
                        item_id,
                        TransactionType::StatusChange,
                        Some(item.location_id),
                        Some(item.location_id),
                        Some(previous.to_string()),
                        Some(new_status.to_string()),
                        notes,
                        performed_by,
                    ))
                    .exec_without_returning(txn)
                    .await?;

                    Ok((
                        previous,
                        inventory_item::Model {
                            status: new_status,
                            updated_at: now,
                            ..item
                        },
                    ))
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        self.event_sender
            .send_or_log(Event::InventoryItemStatusChanged {
                item_id,
                old_status: previous.to_string(),
                new_status: new_status.to_string(),
            })
            .await;
        info!(item_id = %item_id, from = %previous, to = %new_status, "Item status changed");

        Ok(updated)
    }

    /// Records a condition change (e.g. damage) on an unsold item.
    ///
    /// Setting the condition the item already has is a no-op.
    #[instrument(skip(self, notes))]
    pub async fn set_condition(
        &self,
        item_id: Uuid,
        new_condition: ItemCondition,
        notes: Option<String>,
        performed_by: Option<String>,
    ) -> Result<inventory_item::Model, ServiceError> {
        let notes = optional_text(notes);

        let (previous, updated) = self
            .db_pool
            .transaction::<_, (ItemCondition, inventory_item::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = find_item_for_update(txn, item_id).await?;
                    let previous = item.condition;

                    if item.status.is_terminal() {
                        return Err(ServiceError::InvalidState(format!(
                            "Item {} is sold; its condition can no longer change",
                            item_id
                        )));
                    }
                    if previous == new_condition {
                        return Ok((previous, item));
                    }

                    let now = Utc::now();
                    InventoryItem::update_many()
                        .col_expr(inventory_item::Column::Condition, Expr::value(new_condition))
                        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(now))
                        .filter(inventory_item::Column::Id.eq(item_id))
                        .exec(txn)
                        .await?;

                    InventoryTransaction::insert(movement(
                        item_id,
                        TransactionType::ConditionChange,
                        Some(item.location_id),
                        Some(item.location_id),
                        Some(previous.to_string()),
                        Some(new_condition.to_string()),
                        notes,
                        performed_by,
                    ))
                    .exec_without_returning(txn)
                    .await?;

                    Ok((
                        previous,
                        inventory_item::Model {
                            condition: new_condition,
                            updated_at: now,
                            ..item
                        },
                    ))
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        if previous != new_condition {
            self.event_sender
                .send_or_log(Event::InventoryItemConditionChanged {
                    item_id,
                    old_condition: previous.to_string(),
                    new_condition: new_condition.to_string(),
                })
                .await;
            info!(item_id = %item_id, from = %previous, to = %new_condition, "Item condition changed");
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<inventory_item::Model, ServiceError> {
        InventoryItem::find_by_id(item_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))
    }

    /// Items matching the filters, oldest first.
    #[instrument(skip(self))]
    pub async fn query_items(
        &self,
        query: ItemQuery,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let limit = query.effective_limit();
        let mut select = InventoryItem::find();
        if let Some(variant_id) = query.variant_id {
            select = select.filter(inventory_item::Column::VariantId.eq(variant_id));
        }
        if let Some(location_id) = query.location_id {
            select = select.filter(inventory_item::Column::LocationId.eq(location_id));
        }
        if let Some(status) = query.status {
            select = select.filter(inventory_item::Column::Status.eq(status));
        }
        if let Some(condition) = query.condition {
            select = select.filter(inventory_item::Column::Condition.eq(condition));
        }

        Ok(select
            .order_by_asc(inventory_item::Column::CreatedAt)
            .order_by_asc(inventory_item::Column::Id)
            .limit(limit)
            .offset(query.offset.unwrap_or(0))
            .all(&*self.db_pool)
            .await?)
    }

    /// Movement log of one item, newest first.
    #[instrument(skip(self))]
    pub async fn item_history(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<inventory_transaction::Model>, ServiceError> {
        self.get_item(item_id).await?;

        Ok(InventoryTransaction::find()
            .filter(inventory_transaction::Column::ItemId.eq(item_id))
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .order_by_desc(inventory_transaction::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }
}

/// Loads an item, taking a row lock where the backend supports it.
async fn find_item_for_update<C: ConnectionTrait>(
    txn: &C,
    item_id: Uuid,
) -> Result<inventory_item::Model, ServiceError> {
    let mut select = InventoryItem::find_by_id(item_id);
    if db::supports_row_locks(txn) {
        select = select.lock_exclusive();
    }

    select.one(txn).await?.ok_or_else(|| {
        warn!(item_id = %item_id, "Inventory item not found");
        ServiceError::NotFound(format!("Inventory item {} not found", item_id))
    })
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn movement(
    item_id: Uuid,
    transaction_type: TransactionType,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    previous_value: Option<String>,
    new_value: Option<String>,
    notes: Option<String>,
    performed_by: Option<String>,
) -> inventory_transaction::ActiveModel {
    inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_id: Set(item_id),
        transaction_type: Set(transaction_type),
        from_location_id: Set(from_location_id),
        to_location_id: Set(to_location_id),
        previous_value: Set(previous_value),
        new_value: Set(new_value),
        notes: Set(notes),
        performed_by: Set(performed_by),
        created_at: Set(Utc::now()),
    }
}
