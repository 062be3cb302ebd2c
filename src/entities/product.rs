use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storefront product as seen by the inventory core.
///
/// `quantity` and `reserved_quantity` are the flat stock counters used by
/// products that were never split into variants.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub base_price: Decimal,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Units sellable under the flat counters, never negative.
    pub fn legacy_available(&self) -> i64 {
        (i64::from(self.quantity) - i64::from(self.reserved_quantity)).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(quantity: i32, reserved_quantity: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Linen Shirt".into(),
            description: None,
            base_price: dec!(49.00),
            quantity,
            reserved_quantity,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_available_subtracts_reserved() {
        assert_eq!(product(10, 3).legacy_available(), 7);
    }

    #[test]
    fn legacy_available_clamps_at_zero() {
        assert_eq!(product(2, 5).legacy_available(), 0);
    }
}
