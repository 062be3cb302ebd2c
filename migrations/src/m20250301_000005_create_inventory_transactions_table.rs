use sea_orm_migration::prelude::*;

use super::m20250301_000004_create_inventory_items_table::InventoryItems;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000005_create_inventory_transactions_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Location ids are kept as plain values so the audit trail never pins a location.
        manager
            .create_table(
                Table::create()
                    .table(InventoryTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::ItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::TransactionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::FromLocationId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::ToLocationId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::PreviousValue)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::NewValue)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryTransactions::Notes).text().null())
                    .col(
                        ColumnDef::new(InventoryTransactions::PerformedBy)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_transactions_item_id")
                            .from(InventoryTransactions::Table, InventoryTransactions::ItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_transactions_item_id")
                    .table(InventoryTransactions::Table)
                    .col(InventoryTransactions::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryTransactions {
    Table,
    Id,
    ItemId,
    TransactionType,
    FromLocationId,
    ToLocationId,
    PreviousValue,
    NewValue,
    Notes,
    PerformedBy,
    CreatedAt,
}
