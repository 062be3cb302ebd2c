//! Read-side projection over the ledger.
//!
//! Nothing here takes locks or caches counts: every call queries the current
//! ledger. Grouping happens in SQL, the join to display names in memory.

use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as InventoryItem, ItemStatus},
        location::{self, Entity as Location, LocationType},
        product::{self, Entity as Product},
        product_variant::{self, Entity as ProductVariant},
    },
    errors::ServiceError,
};
use sea_orm::{
    sea_query::Expr,
    ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockFilter {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// Stock of one variant at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockSummaryRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_id: Uuid,
    pub variant_name: String,
    pub variant_sku: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub location_type: LocationType,
    pub available_count: i64,
    pub reserved_count: i64,
    pub sold_count: i64,
    pub total_items: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockSeverity {
    Low,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LowStockRow {
    #[serde(flatten)]
    pub stock: StockSummaryRow,
    pub threshold: i64,
    pub severity: StockSeverity,
}

/// Where a product's total came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockSource {
    Ledger,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductStock {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_available: i64,
    pub in_stock: bool,
    pub source: StockSource,
    pub variant_count: u64,
}

/// Per-status item counts for one group of ledger rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
}

impl StatusTally {
    pub(crate) fn add(&mut self, status: ItemStatus, count: i64) {
        match status {
            ItemStatus::Available => self.available += count,
            ItemStatus::Reserved => self.reserved += count,
            ItemStatus::Sold => self.sold += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.available + self.reserved + self.sold
    }
}

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    variant_id: Uuid,
    location_id: Uuid,
    status: String,
    item_count: i64,
}

#[derive(Debug, FromQueryResult)]
struct VariantStatusCount {
    variant_id: Uuid,
    status: String,
    item_count: i64,
}

/// Counts for each of `variant_ids` across every location.
///
/// Every requested variant gets an entry; variants with no ledger rows tally to zero.
pub(crate) async fn tally_by_variant<C: ConnectionTrait>(
    db: &C,
    variant_ids: &[Uuid],
) -> Result<HashMap<Uuid, StatusTally>, ServiceError> {
    let mut tallies: HashMap<Uuid, StatusTally> = variant_ids
        .iter()
        .map(|id| (*id, StatusTally::default()))
        .collect();
    if variant_ids.is_empty() {
        return Ok(tallies);
    }

    let counts = InventoryItem::find()
        .select_only()
        .column(inventory_item::Column::VariantId)
        .column(inventory_item::Column::Status)
        .column_as(
            Expr::col((InventoryItem, inventory_item::Column::Id)).count(),
            "item_count",
        )
        .filter(inventory_item::Column::VariantId.is_in(variant_ids.to_vec()))
        .group_by(inventory_item::Column::VariantId)
        .group_by(inventory_item::Column::Status)
        .into_model::<VariantStatusCount>()
        .all(db)
        .await?;

    for row in counts {
        let status = ItemStatus::try_from_value(&row.status)?;
        tallies
            .entry(row.variant_id)
            .or_default()
            .add(status, row.item_count);
    }
    Ok(tallies)
}

/// Folds grouped `(variant, location, status, count)` rows into one tally per pair.
pub fn fold_status_counts<I>(rows: I) -> BTreeMap<(Uuid, Uuid), StatusTally>
where
    I: IntoIterator<Item = (Uuid, Uuid, ItemStatus, i64)>,
{
    let mut tallies: BTreeMap<(Uuid, Uuid), StatusTally> = BTreeMap::new();
    for (variant_id, location_id, status, count) in rows {
        tallies
            .entry((variant_id, location_id))
            .or_default()
            .add(status, count);
    }
    tallies
}

/// Product name, variant name, location name, then ids.
pub fn sort_summary(rows: &mut [StockSummaryRow]) {
    rows.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then_with(|| a.variant_name.cmp(&b.variant_name))
            .then_with(|| a.location_name.cmp(&b.location_name))
            .then_with(|| a.variant_id.cmp(&b.variant_id))
            .then_with(|| a.location_id.cmp(&b.location_id))
    });
}

/// Rows below `threshold`, fewest available first; ties keep summary order.
pub fn select_low_stock(rows: Vec<StockSummaryRow>, threshold: i64) -> Vec<LowStockRow> {
    let mut low: Vec<LowStockRow> = rows
        .into_iter()
        .filter(|row| row.available_count < threshold)
        .map(|row| LowStockRow {
            severity: if row.available_count == 0 {
                StockSeverity::Critical
            } else {
                StockSeverity::Low
            },
            threshold,
            stock: row,
        })
        .collect();
    low.sort_by_key(|row| row.stock.available_count);
    low
}

/// Stock aggregator
pub struct StockService {
    db_pool: Arc<DbPool>,
    default_low_stock_threshold: i64,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, default_low_stock_threshold: i64) -> Self {
        Self {
            db_pool,
            default_low_stock_threshold,
        }
    }

    /// Available/reserved/sold counts per (variant, location)
    #[instrument(skip(self))]
    pub async fn summary(&self, filter: StockFilter) -> Result<Vec<StockSummaryRow>, ServiceError> {
        let db = &*self.db_pool;

        let mut select = InventoryItem::find()
            .select_only()
            .column(inventory_item::Column::VariantId)
            .column(inventory_item::Column::LocationId)
            .column(inventory_item::Column::Status)
            .column_as(
                Expr::col((InventoryItem, inventory_item::Column::Id)).count(),
                "item_count",
            )
            .group_by(inventory_item::Column::VariantId)
            .group_by(inventory_item::Column::LocationId)
            .group_by(inventory_item::Column::Status);

        if let Some(variant_id) = filter.variant_id {
            select = select.filter(inventory_item::Column::VariantId.eq(variant_id));
        }
        if let Some(location_id) = filter.location_id {
            select = select.filter(inventory_item::Column::LocationId.eq(location_id));
        }
        if let Some(product_id) = filter.product_id {
            let variant_ids = self.variant_ids_of(product_id).await?;
            if variant_ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(inventory_item::Column::VariantId.is_in(variant_ids));
        }

        let counts = select.into_model::<GroupCount>().all(db).await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let mut grouped = Vec::with_capacity(counts.len());
        for row in counts {
            let status = ItemStatus::try_from_value(&row.status)?;
            grouped.push((row.variant_id, row.location_id, status, row.item_count));
        }
        let tallies = fold_status_counts(grouped);

        let variant_ids: Vec<Uuid> = tallies.keys().map(|(v, _)| *v).collect();
        let location_ids: Vec<Uuid> = tallies.keys().map(|(_, l)| *l).collect();

        let variants: HashMap<Uuid, product_variant::Model> = ProductVariant::find()
            .filter(product_variant::Column::Id.is_in(variant_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
        let product_ids: Vec<Uuid> = variants.values().map(|v| v.product_id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let locations: HashMap<Uuid, location::Model> = Location::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let mut rows = Vec::with_capacity(tallies.len());
        for ((variant_id, location_id), tally) in tallies {
            let (Some(variant), Some(location)) =
                (variants.get(&variant_id), locations.get(&location_id))
            else {
                warn!(%variant_id, %location_id, "Skipping stock group with dangling reference");
                continue;
            };
            let product_name = products
                .get(&variant.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();

            rows.push(StockSummaryRow {
                product_id: variant.product_id,
                product_name,
                variant_id,
                variant_name: variant.variant_name.clone(),
                variant_sku: variant.variant_sku.clone(),
                location_id,
                location_name: location.name.clone(),
                location_type: location.location_type,
                available_count: tally.available,
                reserved_count: tally.reserved,
                sold_count: tally.sold,
                total_items: tally.total(),
            });
        }

        sort_summary(&mut rows);
        Ok(rows)
    }

    /// Summary restricted to one location
    #[instrument(skip(self))]
    pub async fn location_summary(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<StockSummaryRow>, ServiceError> {
        if Location::find_by_id(location_id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Location {} not found",
                location_id
            )));
        }

        self.summary(StockFilter {
            location_id: Some(location_id),
            ..Default::default()
        })
        .await
    }

    /// (variant, location) pairs with fewer than `threshold` available units
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: Option<i64>) -> Result<Vec<LowStockRow>, ServiceError> {
        let threshold = threshold.unwrap_or(self.default_low_stock_threshold);
        if threshold < 0 {
            return Err(ServiceError::ValidationError(
                "threshold must not be negative".to_string(),
            ));
        }

        let rows = self.summary(StockFilter::default()).await?;
        Ok(select_low_stock(rows, threshold))
    }

    /// Sellable units of a product, from the ledger or the legacy counters
    #[instrument(skip(self))]
    pub async fn product_total_stock(&self, product_id: Uuid) -> Result<ProductStock, ServiceError> {
        let db = &*self.db_pool;
        let product = Product::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let variant_ids = self.variant_ids_of(product_id).await?;
        let variant_count = variant_ids.len() as u64;

        let (total_available, source) = if variant_ids.is_empty() {
            (product.legacy_available(), StockSource::Legacy)
        } else {
            let available = InventoryItem::find()
                .filter(inventory_item::Column::VariantId.is_in(variant_ids))
                .filter(inventory_item::Column::Status.eq(ItemStatus::Available))
                .count(db)
                .await?;
            (available as i64, StockSource::Ledger)
        };

        Ok(ProductStock {
            product_id,
            product_name: product.name,
            total_available,
            in_stock: total_available > 0,
            source,
            variant_count,
        })
    }

    async fn variant_ids_of(&self, product_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        Ok(ProductVariant::find()
            .select_only()
            .column(product_variant::Column::Id)
            .filter(product_variant::Column::ProductId.eq(product_id))
            .into_tuple::<Uuid>()
            .all(&*self.db_pool)
            .await?)
    }
}
