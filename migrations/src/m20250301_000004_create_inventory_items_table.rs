use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_locations_table::Locations;
use super::m20250301_000003_create_product_variants_table::ProductVariants;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000004_create_inventory_items_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per physical unit. Rows are re-tagged, never deleted.
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InventoryItems::VariantId).uuid().not_null())
                    .col(ColumnDef::new(InventoryItems::LocationId).uuid().not_null())
                    .col(
                        ColumnDef::new(InventoryItems::Status)
                            .string_len(20)
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Condition)
                            .string_len(20)
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::PurchaseCost)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::SupplierBatch)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryItems::Notes).text().null())
                    .col(
                        ColumnDef::new(InventoryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_items_variant_id")
                            .from(InventoryItems::Table, InventoryItems::VariantId)
                            .to(ProductVariants::Table, ProductVariants::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_items_location_id")
                            .from(InventoryItems::Table, InventoryItems::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_variant_location_status")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::VariantId)
                    .col(InventoryItems::LocationId)
                    .col(InventoryItems::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_location_id")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::LocationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryItems {
    Table,
    Id,
    VariantId,
    LocationId,
    Status,
    Condition,
    PurchaseCost,
    SupplierBatch,
    Notes,
    CreatedAt,
    UpdatedAt,
}
