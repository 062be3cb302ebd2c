use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position of a unit in the order lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "sold")]
    Sold,
}

impl ItemStatus {
    /// Forward transitions driven by checkout, plus release of a reservation.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Available, ItemStatus::Reserved)
                | (ItemStatus::Reserved, ItemStatus::Sold)
                | (ItemStatus::Reserved, ItemStatus::Available)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ItemStatus::Sold
    }
}

/// Physical condition of a unit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemCondition {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "used")]
    Used,
    #[sea_orm(string_value = "damaged")]
    Damaged,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub variant_id: Uuid,
    pub location_id: Uuid,
    pub status: ItemStatus,
    pub condition: ItemCondition,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub purchase_cost: Option<Decimal>,
    pub supplier_batch: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_variant::Entity",
        from = "Column::VariantId",
        to = "super::product_variant::Column::Id"
    )]
    Variant,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::inventory_transaction::Entity")]
    Transactions,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::inventory_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sea_orm::Iterable;

    #[rstest]
    #[case(ItemStatus::Available, ItemStatus::Reserved, true)]
    #[case(ItemStatus::Reserved, ItemStatus::Sold, true)]
    #[case(ItemStatus::Reserved, ItemStatus::Available, true)]
    #[case(ItemStatus::Available, ItemStatus::Sold, false)]
    #[case(ItemStatus::Available, ItemStatus::Available, false)]
    #[case(ItemStatus::Sold, ItemStatus::Available, false)]
    #[case(ItemStatus::Sold, ItemStatus::Reserved, false)]
    #[case(ItemStatus::Sold, ItemStatus::Sold, false)]
    fn status_transitions(
        #[case] from: ItemStatus,
        #[case] to: ItemStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn sold_has_no_way_out() {
        for next in ItemStatus::iter() {
            assert!(!ItemStatus::Sold.can_transition_to(next));
        }
        assert!(ItemStatus::Sold.is_terminal());
    }

    #[test]
    fn status_renders_as_stored_value() {
        assert_eq!(ItemStatus::Reserved.to_string(), "reserved");
        assert_eq!(ItemCondition::Damaged.to_string(), "damaged");
    }
}
