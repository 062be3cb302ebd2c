use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle used by services to publish domain events
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    ///
    /// Events are published after the database work has committed, so a
    /// closed channel must never turn a successful request into an error.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Domain events emitted after inventory state changes commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    ProductCreated(Uuid),
    LegacyStockUpdated {
        product_id: Uuid,
        quantity: i32,
        reserved_quantity: i32,
    },

    LocationCreated(Uuid),
    LocationUpdated(Uuid),
    LocationDeactivated(Uuid),
    LocationDeleted(Uuid),

    VariantCreated {
        variant_id: Uuid,
        product_id: Uuid,
        sku: String,
    },
    VariantUpdated(Uuid),
    VariantDeactivated(Uuid),
    VariantDeleted(Uuid),

    InventoryItemsAdded {
        variant_id: Uuid,
        location_id: Uuid,
        item_ids: Vec<Uuid>,
    },
    InventoryItemStatusChanged {
        item_id: Uuid,
        old_status: String,
        new_status: String,
    },
    InventoryItemConditionChanged {
        item_id: Uuid,
        old_condition: String,
        new_condition: String,
    },
    StockTransferred {
        variant_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        item_ids: Vec<Uuid>,
        performed_by: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProductCreated(_) => "product_created",
            Event::LegacyStockUpdated { .. } => "legacy_stock_updated",
            Event::LocationCreated(_) => "location_created",
            Event::LocationUpdated(_) => "location_updated",
            Event::LocationDeactivated(_) => "location_deactivated",
            Event::LocationDeleted(_) => "location_deleted",
            Event::VariantCreated { .. } => "variant_created",
            Event::VariantUpdated(_) => "variant_updated",
            Event::VariantDeactivated(_) => "variant_deactivated",
            Event::VariantDeleted(_) => "variant_deleted",
            Event::InventoryItemsAdded { .. } => "inventory_items_added",
            Event::InventoryItemStatusChanged { .. } => "inventory_item_status_changed",
            Event::InventoryItemConditionChanged { .. } => "inventory_item_condition_changed",
            Event::StockTransferred { .. } => "stock_transferred",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::InventoryItemsAdded {
                variant_id,
                location_id,
                item_ids,
            } => {
                info!(
                    event = event.name(),
                    %variant_id,
                    %location_id,
                    count = item_ids.len(),
                    "inventory received"
                );
            }
            Event::StockTransferred {
                variant_id,
                from_location_id,
                to_location_id,
                item_ids,
                ..
            } => {
                info!(
                    event = event.name(),
                    %variant_id,
                    %from_location_id,
                    %to_location_id,
                    count = item_ids.len(),
                    "stock transferred"
                );
            }
            Event::InventoryItemStatusChanged {
                item_id,
                old_status,
                new_status,
            } => {
                info!(
                    event = event.name(),
                    %item_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "item status changed"
                );
            }
            other => info!(event = other.name(), payload = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}
