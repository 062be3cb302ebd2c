mod common;

use atelier_inventory::entities::{inventory_item::ItemStatus, location::LocationType};
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::{json, Value};

fn rows(body: &Value) -> &Vec<Value> {
    body["data"].as_array().unwrap()
}

#[tokio::test]
async fn summary_counts_each_status_and_orders_rows() {
    let app = TestApp::new().await;
    let coat = app.seed_product("Coat").await;
    let belt = app.seed_product("Belt").await;
    let coat_m = app.seed_variant(coat.id, "CO-M").await;
    let belt_os = app.seed_variant(belt.id, "BE-OS").await;
    let north = app.seed_location("North", LocationType::Warehouse).await;
    let south = app.seed_location("South", LocationType::Store).await;

    let coat_items = app.seed_items(coat_m.id, south.id, 4).await;
    app.seed_items(coat_m.id, north.id, 2).await;
    app.seed_items(belt_os.id, north.id, 1).await;

    let ledger = app.state.services.ledger.clone();
    ledger
        .set_status(coat_items[0].id, ItemStatus::Reserved, None, None)
        .await
        .unwrap();
    ledger
        .set_status(coat_items[1].id, ItemStatus::Reserved, None, None)
        .await
        .unwrap();
    ledger
        .set_status(coat_items[1].id, ItemStatus::Sold, None, None)
        .await
        .unwrap();

    let response = app
        .request_authenticated(Method::GET, "/api/inventory/summary", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = rows(&body);

    let order: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| {
            (
                r["product_name"].as_str().unwrap(),
                r["location_name"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![("Belt", "North"), ("Coat", "North"), ("Coat", "South")]
    );

    let coat_south = &rows[2];
    assert_eq!(coat_south["available_count"], 2);
    assert_eq!(coat_south["reserved_count"], 1);
    assert_eq!(coat_south["sold_count"], 1);
    assert_eq!(coat_south["total_items"], 4);
    assert_eq!(coat_south["variant_sku"], "CO-M");
    assert_eq!(coat_south["location_type"], "store");

    for row in rows {
        assert!(row["available_count"].as_i64() <= row["total_items"].as_i64());
    }
}

#[tokio::test]
async fn summary_filters_by_product_variant_and_location() {
    let app = TestApp::new().await;
    let coat = app.seed_product("Coat").await;
    let belt = app.seed_product("Belt").await;
    let coat_m = app.seed_variant(coat.id, "CO-M").await;
    let coat_l = app.seed_variant(coat.id, "CO-L").await;
    let belt_os = app.seed_variant(belt.id, "BE-OS").await;
    let north = app.seed_location("North", LocationType::Warehouse).await;
    let south = app.seed_location("South", LocationType::Store).await;
    app.seed_items(coat_m.id, north.id, 1).await;
    app.seed_items(coat_l.id, south.id, 1).await;
    app.seed_items(belt_os.id, south.id, 1).await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/summary?product_id={}", coat.id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(rows(&body).len(), 2);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/summary?location_id={}", south.id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(rows(&body).len(), 2);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!(
                "/api/inventory/summary?variant_id={}&location_id={}",
                coat_l.id, north.id
            ),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert!(rows(&body).is_empty());

    // product without variants yields nothing rather than everything
    let bare = app.seed_product("Bare").await;
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/summary?product_id={}", bare.id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert!(rows(&body).is_empty());
}

#[tokio::test]
async fn low_stock_uses_threshold_and_marks_empty_pairs_critical() {
    let app = TestApp::new().await;
    let product = app.seed_product("Boots").await;
    let boots_38 = app.seed_variant(product.id, "BO-38").await;
    let boots_40 = app.seed_variant(product.id, "BO-40").await;
    let boots_42 = app.seed_variant(product.id, "BO-42").await;
    let store = app.seed_location("Flagship", LocationType::Store).await;

    let sold_out = app.seed_items(boots_38.id, store.id, 1).await;
    app.seed_items(boots_40.id, store.id, 3).await;
    app.seed_items(boots_42.id, store.id, 8).await;

    let ledger = app.state.services.ledger.clone();
    ledger
        .set_status(sold_out[0].id, ItemStatus::Reserved, None, None)
        .await
        .unwrap();

    // server default threshold is 5
    let response = app
        .request_authenticated(Method::GET, "/api/inventory/low-stock", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let low = rows(&body);
    assert_eq!(low.len(), 2);
    assert_eq!(low[0]["variant_sku"], "BO-38");
    assert_eq!(low[0]["available_count"], 0);
    assert_eq!(low[0]["severity"], "critical");
    assert_eq!(low[0]["threshold"], 5);
    assert_eq!(low[1]["variant_sku"], "BO-40");
    assert_eq!(low[1]["severity"], "low");

    let response = app
        .request_authenticated(Method::GET, "/api/inventory/low-stock?threshold=10", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(rows(&body).len(), 3);

    let response = app
        .request_authenticated(Method::GET, "/api/inventory/low-stock?threshold=0", None)
        .await;
    let body = read_json(response).await;
    assert!(rows(&body).is_empty());

    let response = app
        .request_authenticated(Method::GET, "/api/inventory/low-stock?threshold=-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_stock_comes_from_the_ledger_once_variants_exist() {
    let app = TestApp::new().await;
    let product = app.seed_product("Parka").await;
    let parka_s = app.seed_variant(product.id, "PA-S").await;
    let parka_m = app.seed_variant(product.id, "PA-M").await;
    let north = app.seed_location("North", LocationType::Warehouse).await;
    let south = app.seed_location("South", LocationType::Store).await;
    let items = app.seed_items(parka_s.id, north.id, 2).await;
    app.seed_items(parka_m.id, south.id, 3).await;
    app.state
        .services
        .ledger
        .set_status(items[0].id, ItemStatus::Reserved, None, None)
        .await
        .unwrap();

    // legacy counters are ignored when the product has variants
    app.state
        .services
        .products
        .set_legacy_stock(
            product.id,
            atelier_inventory::services::products::LegacyStockInput {
                quantity: 100,
                reserved_quantity: 0,
            },
        )
        .await
        .unwrap();

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/products/{}/stock", product.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total_available"], 4);
    assert_eq!(body["data"]["in_stock"], true);
    assert_eq!(body["data"]["source"], "ledger");
    assert_eq!(body["data"]["variant_count"], 2);
}

#[tokio::test]
async fn product_without_variants_uses_legacy_counters() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/products",
            Some(json!({
                "name": "Classic Tote",
                "base_price": "120.00",
                "quantity": 10,
                "reserved_quantity": 3
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/products/{}/stock", product_id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total_available"], 7);
    assert_eq!(body["data"]["source"], "legacy");
    assert_eq!(body["data"]["variant_count"], 0);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/products/{}/legacy-stock", product_id),
            Some(json!({ "quantity": 2, "reserved_quantity": 2 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/products/{}/stock", product_id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total_available"], 0);
    assert_eq!(body["data"]["in_stock"], false);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/products/{}/legacy-stock", product_id),
            Some(json!({ "quantity": -1, "reserved_quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/products/{}/stock", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inactive_variants_and_locations_still_show_in_summary() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cap").await;
    let variant = app.seed_variant(product.id, "CAP-OS").await;
    let store = app.seed_location("Kiosk", LocationType::Store).await;
    app.seed_items(variant.id, store.id, 2).await;

    app.state
        .services
        .variants
        .deactivate_variant(variant.id)
        .await
        .unwrap();
    app.state
        .services
        .locations
        .deactivate_location(store.id)
        .await
        .unwrap();

    let response = app
        .request_authenticated(Method::GET, "/api/inventory/summary", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(rows(&body).len(), 1);
    assert_eq!(rows(&body)[0]["available_count"], 2);
}
