//! Moves units of one variant between locations.
//!
//! A transfer re-tags existing ledger rows; it never creates or deletes
//! items. Selection and update share one transaction. On Postgres the
//! candidate rows are taken `FOR UPDATE SKIP LOCKED`, so a concurrent
//! transfer picks the next free units instead of waiting on rows that are
//! about to leave the source. SQLite runs on a single pooled connection and
//! serialises transfers outright. Either way the update is guarded on the
//! rows still being available at the source, so two overlapping transfers
//! can never both claim the same unit.

use crate::{
    db::{self, DbPool},
    entities::{
        inventory_item::{self, Entity as InventoryItem, ItemStatus},
        inventory_transaction::{Entity as InventoryTransaction, TransactionType},
        location::{self, Entity as Location},
        product_variant::Entity as ProductVariant,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger::movement, optional_text},
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub variant_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferResult {
    pub transferred_count: usize,
    pub item_ids: Vec<Uuid>,
    pub variant_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
}

pub struct TransferService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl TransferService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// All-or-nothing transfer of the oldest available units.
    #[instrument(skip(self, request), fields(
        variant_id = %request.variant_id,
        from = %request.from_location_id,
        to = %request.to_location_id,
        quantity = request.quantity,
    ))]
    pub async fn transfer(
        &self,
        request: TransferRequest,
        performed_by: Option<String>,
    ) -> Result<TransferResult, ServiceError> {
        if request.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        if request.from_location_id == request.to_location_id {
            return Err(ServiceError::ValidationError(
                "from_location_id and to_location_id must differ".to_string(),
            ));
        }

        let TransferRequest {
            from_location_id,
            to_location_id,
            variant_id,
            quantity,
            notes,
        } = request;
        let notes = optional_text(notes);
        let wanted = quantity as usize;
        let actor = performed_by.clone();

        let item_ids = self
            .db_pool
            .transaction::<_, Vec<Uuid>, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_active_location(txn, from_location_id, "Source").await?;
                    ensure_active_location(txn, to_location_id, "Destination").await?;
                    if ProductVariant::find_by_id(variant_id).one(txn).await?.is_none() {
                        return Err(ServiceError::ValidationError(format!(
                            "Variant {} does not exist",
                            variant_id
                        )));
                    }

                    let mut candidates = InventoryItem::find()
                        .select_only()
                        .column(inventory_item::Column::Id)
                        .filter(inventory_item::Column::VariantId.eq(variant_id))
                        .filter(inventory_item::Column::LocationId.eq(from_location_id))
                        .filter(inventory_item::Column::Status.eq(ItemStatus::Available))
                        .order_by_asc(inventory_item::Column::CreatedAt)
                        .order_by_asc(inventory_item::Column::Id)
                        .limit(wanted as u64);
                    if db::supports_row_locks(txn) {
                        candidates = candidates
                            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
                    }
                    let ids: Vec<Uuid> = candidates.into_tuple::<Uuid>().all(txn).await?;

                    if ids.len() < wanted {
                        warn!(requested = wanted, available = ids.len(), "Insufficient stock for transfer");
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, available {}",
                            wanted,
                            ids.len()
                        )));
                    }

                    let updated = InventoryItem::update_many()
                        .col_expr(inventory_item::Column::LocationId, Expr::value(to_location_id))
                        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(inventory_item::Column::Id.is_in(ids.clone()))
                        .filter(inventory_item::Column::LocationId.eq(from_location_id))
                        .filter(inventory_item::Column::Status.eq(ItemStatus::Available))
                        .exec(txn)
                        .await?;
                    if updated.rows_affected != wanted as u64 {
                        warn!(
                            requested = wanted,
                            moved = updated.rows_affected,
                            "Transfer lost a race; rolling back"
                        );
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, only {} still available",
                            wanted, updated.rows_affected
                        )));
                    }

                    InventoryTransaction::insert_many(ids.iter().map(|id| {
                        movement(
                            *id,
                            TransactionType::Transfer,
                            Some(from_location_id),
                            Some(to_location_id),
                            Some(from_location_id.to_string()),
                            Some(to_location_id.to_string()),
                            notes.clone(),
                            actor.clone(),
                        )
                    }))
                    .exec_without_returning(txn)
                    .await?;

                    Ok(ids)
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        self.event_sender
            .send_or_log(Event::StockTransferred {
                variant_id,
                from_location_id,
                to_location_id,
                item_ids: item_ids.clone(),
                performed_by,
                at: Utc::now(),
            })
            .await;
        info!(count = item_ids.len(), "Stock transferred");

        Ok(TransferResult {
            transferred_count: item_ids.len(),
            item_ids,
            variant_id,
            from_location_id,
            to_location_id,
        })
    }
}

async fn ensure_active_location<C: ConnectionTrait>(
    txn: &C,
    id: Uuid,
    role: &str,
) -> Result<location::Model, ServiceError> {
    let location = Location::find_by_id(id).one(txn).await?.ok_or_else(|| {
        ServiceError::ValidationError(format!("{} location {} does not exist", role, id))
    })?;
    if !location.is_active {
        return Err(ServiceError::ValidationError(format!(
            "{} location '{}' is inactive",
            role, location.name
        )));
    }
    Ok(location)
}
