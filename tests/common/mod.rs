#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use atelier_inventory::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{
        inventory_item,
        location::{self, LocationType},
        product, product_variant,
    },
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        ledger::AddItemsInput, locations::CreateLocationInput, products::CreateProductInput,
        variants::CreateVariantInput,
    },
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str =
    "k9Qz7Lr2Wm4Xv8Ns1Tb6Yc3Hd5Jf0Gp-atelier-inventory-integration-signing-key-2025";

/// Helper harness for spinning up the application backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("atelier_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.low_stock_threshold = 5;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(3600),
        )));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg);
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth: auth_service.clone(),
        };

        let token = auth_service
            .issue_token(
                "admin-1",
                Some("admin@atelier.test".to_string()),
                vec!["admin".to_string()],
                vec![],
            )
            .expect("issue admin token");

        let router = atelier_inventory::build_router(state.clone());

        Self {
            router,
            state,
            token,
            auth_service,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Bearer token for the default admin user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token for a non-admin user holding exactly `permissions`.
    pub fn token_with_permissions(&self, subject: &str, permissions: &[&str]) -> String {
        self.auth_service
            .issue_token(
                subject,
                Some(format!("{}@atelier.test", subject)),
                vec!["staff".to_string()],
                permissions.iter().map(|p| p.to_string()).collect(),
            )
            .expect("issue scoped token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests as the admin user.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn seed_product(&self, name: &str) -> product::Model {
        self.state
            .services
            .products
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: Some("Seeded for integration tests".to_string()),
                base_price: Decimal::new(4900, 2),
                quantity: 0,
                reserved_quantity: 0,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_variant(&self, product_id: Uuid, sku: &str) -> product_variant::Model {
        self.state
            .services
            .variants
            .create_variant(CreateVariantInput {
                product_id,
                variant_name: format!("Variant {}", sku),
                variant_sku: sku.to_string(),
                variant_price: Decimal::new(7900, 2),
                attributes: None,
            })
            .await
            .expect("seed variant")
            .variant
    }

    pub async fn seed_location(&self, name: &str, location_type: LocationType) -> location::Model {
        self.state
            .services
            .locations
            .create_location(CreateLocationInput {
                name: name.to_string(),
                location_type,
                address: None,
                city: Some("Milan".to_string()),
                country: Some("IT".to_string()),
            })
            .await
            .expect("seed location")
    }

    pub async fn seed_items(
        &self,
        variant_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    ) -> Vec<inventory_item::Model> {
        self.state
            .services
            .ledger
            .add_items(
                AddItemsInput {
                    variant_id,
                    location_id,
                    quantity: Some(quantity),
                    status: None,
                    condition: None,
                    purchase_cost: None,
                    supplier_batch: None,
                    notes: None,
                },
                Some("seed".to_string()),
            )
            .await
            .expect("seed items")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads the response body as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
