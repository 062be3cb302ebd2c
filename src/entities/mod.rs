pub mod inventory_item;
pub mod inventory_transaction;
pub mod location;
pub mod product;
pub mod product_variant;
