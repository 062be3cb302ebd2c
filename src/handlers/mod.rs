pub mod common;
pub mod health;
pub mod inventory;
pub mod locations;
pub mod products;
pub mod variants;

use crate::events::EventSender;
use crate::services::{
    ledger::LedgerService, locations::LocationService, products::ProductService,
    stock::StockService, transfers::TransferService, variants::VariantService,
};
use crate::{config::AppConfig, db::DbPool};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub locations: Arc<LocationService>,
    pub variants: Arc<VariantService>,
    pub ledger: Arc<LedgerService>,
    pub stock: Arc<StockService>,
    pub transfers: Arc<TransferService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            locations: Arc::new(LocationService::new(db_pool.clone(), event_sender.clone())),
            variants: Arc::new(VariantService::new(db_pool.clone(), event_sender.clone())),
            ledger: Arc::new(LedgerService::new(db_pool.clone(), event_sender.clone())),
            stock: Arc::new(StockService::new(
                db_pool.clone(),
                i64::from(config.low_stock_threshold),
            )),
            transfers: Arc::new(TransferService::new(db_pool, event_sender)),
        }
    }
}
