mod common;

use assert_matches::assert_matches;
use atelier_inventory::{entities::location::LocationType, errors::ServiceError};
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;
use uuid::Uuid;

struct Fixture {
    app: TestApp,
    variant_id: Uuid,
    location_id: Uuid,
}

async fn fixture() -> Fixture {
    let app = TestApp::new().await;
    let product = app.seed_product("Silk Dress").await;
    let variant = app.seed_variant(product.id, "SD-RED-S").await;
    let location = app.seed_location("Atelier", LocationType::Warehouse).await;
    Fixture {
        app,
        variant_id: variant.id,
        location_id: location.id,
    }
}

#[tokio::test]
async fn add_items_creates_one_row_per_unit() {
    let f = fixture().await;

    let response = f
        .app
        .request_authenticated(
            Method::POST,
            "/api/inventory/items",
            Some(json!({
                "variant_id": f.variant_id,
                "location_id": f.location_id,
                "quantity": 3,
                "purchase_cost": "21.40",
                "supplier_batch": "B-2025-03"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["data"]["created_count"], 3);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    for item in items {
        assert_eq!(item["status"], "available");
        assert_eq!(item["condition"], "new");
        assert_eq!(item["supplier_batch"], "B-2025-03");
    }

    // quantity defaults to a single unit
    let response = f
        .app
        .request_authenticated(
            Method::POST,
            "/api/inventory/items",
            Some(json!({ "variant_id": f.variant_id, "location_id": f.location_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["data"]["created_count"], 1);

    let response = f
        .app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/items?variant_id={}", f.variant_id),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn receipt_is_recorded_with_the_acting_user() {
    let f = fixture().await;

    let response = f
        .app
        .request_authenticated(
            Method::POST,
            "/api/inventory/items",
            Some(json!({ "variant_id": f.variant_id, "location_id": f.location_id })),
        )
        .await;
    let body = read_json(response).await;
    let item_id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let response = f
        .app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/items/{}/transactions", item_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["transaction_type"], "received");
    assert_eq!(history[0]["performed_by"], "admin@atelier.test");
    assert_eq!(history[0]["to_location_id"], f.location_id.to_string());
}

#[tokio::test]
async fn add_items_rejects_bad_references_and_quantities() {
    let f = fixture().await;

    for quantity in [0, -2, 1001] {
        let response = f
            .app
            .request_authenticated(
                Method::POST,
                "/api/inventory/items",
                Some(json!({
                    "variant_id": f.variant_id,
                    "location_id": f.location_id,
                    "quantity": quantity
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "quantity {}", quantity);
    }

    for cost in ["-1.00", "12.555", "100000000.00"] {
        let response = f
            .app
            .request_authenticated(
                Method::POST,
                "/api/inventory/items",
                Some(json!({
                    "variant_id": f.variant_id,
                    "location_id": f.location_id,
                    "purchase_cost": cost
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "purchase_cost {}", cost);
    }

    let response = f
        .app
        .request_authenticated(
            Method::POST,
            "/api/inventory/items",
            Some(json!({ "variant_id": Uuid::new_v4(), "location_id": f.location_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    f.app
        .state
        .services
        .locations
        .deactivate_location(f.location_id)
        .await
        .unwrap();
    let response = f
        .app
        .request_authenticated(
            Method::POST,
            "/api/inventory/items",
            Some(json!({ "variant_id": f.variant_id, "location_id": f.location_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_follows_the_lifecycle() {
    let f = fixture().await;
    let item = f.app.seed_items(f.variant_id, f.location_id, 1).await.remove(0);
    let uri = format!("/api/inventory/items/{}/status", item.id);

    // available -> sold skips the reservation
    let response = f
        .app
        .request_authenticated(Method::PUT, &uri, Some(json!({ "status": "sold" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = f
        .app
        .request_authenticated(
            Method::PUT,
            &uri,
            Some(json!({ "status": "reserved", "notes": "cart 812" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "reserved");

    let response = f
        .app
        .request_authenticated(Method::PUT, &uri, Some(json!({ "status": "sold" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // sold is terminal
    for next in ["available", "reserved"] {
        let response = f
            .app
            .request_authenticated(Method::PUT, &uri, Some(json!({ "status": next })))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    let response = f
        .app
        .request_authenticated(
            Method::GET,
            &format!("/api/inventory/items/{}/transactions", item.id),
            None,
        )
        .await;
    let body = read_json(response).await;
    let history = body["data"].as_array().unwrap();
    let kinds: Vec<&str> = history
        .iter()
        .map(|t| t["transaction_type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["status_change", "status_change", "received"]);
    assert_eq!(history[0]["previous_value"], "reserved");
    assert_eq!(history[0]["new_value"], "sold");
    assert_eq!(history[1]["notes"], "cart 812");
}

#[tokio::test]
async fn reservation_can_be_released() {
    let f = fixture().await;
    let item = f.app.seed_items(f.variant_id, f.location_id, 1).await.remove(0);
    let ledger = f.app.state.services.ledger.clone();

    ledger
        .set_status(
            item.id,
            atelier_inventory::entities::inventory_item::ItemStatus::Reserved,
            None,
            None,
        )
        .await
        .unwrap();
    let released = ledger
        .set_status(
            item.id,
            atelier_inventory::entities::inventory_item::ItemStatus::Available,
            Some("cart expired".into()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        released.status,
        atelier_inventory::entities::inventory_item::ItemStatus::Available
    );

    let same = ledger
        .set_status(
            item.id,
            atelier_inventory::entities::inventory_item::ItemStatus::Available,
            None,
            None,
        )
        .await;
    assert_matches!(same, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn condition_changes_are_logged_and_frozen_once_sold() {
    let f = fixture().await;
    let item = f.app.seed_items(f.variant_id, f.location_id, 1).await.remove(0);
    let uri = format!("/api/inventory/items/{}/condition", item.id);

    let response = f
        .app
        .request_authenticated(
            Method::PUT,
            &uri,
            Some(json!({ "condition": "damaged", "notes": "torn hem" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["condition"], "damaged");
    assert_eq!(body["data"]["status"], "available");

    // same condition again is a no-op
    let response = f
        .app
        .request_authenticated(Method::PUT, &uri, Some(json!({ "condition": "damaged" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let history = f
        .app
        .state
        .services
        .ledger
        .item_history(item.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    let status_uri = format!("/api/inventory/items/{}/status", item.id);
    for status in ["reserved", "sold"] {
        let response = f
            .app
            .request_authenticated(Method::PUT, &status_uri, Some(json!({ "status": status })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = f
        .app
        .request_authenticated(Method::PUT, &uri, Some(json!({ "condition": "used" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_status_value_is_a_bad_request() {
    let f = fixture().await;
    let item = f.app.seed_items(f.variant_id, f.location_id, 1).await.remove(0);

    let response = f
        .app
        .request_authenticated(
            Method::PUT,
            &format!("/api/inventory/items/{}/status", item.id),
            Some(json!({ "status": "lost" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_items_are_not_found() {
    let f = fixture().await;
    let missing = Uuid::new_v4();

    for uri in [
        format!("/api/inventory/items/{}", missing),
        format!("/api/inventory/items/{}/transactions", missing),
    ] {
        let response = f.app.request_authenticated(Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let response = f
        .app
        .request_authenticated(
            Method::PUT,
            &format!("/api/inventory/items/{}/status", missing),
            Some(json!({ "status": "reserved" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn query_filters_and_pages_oldest_first() {
    let f = fixture().await;
    let first = f.app.seed_items(f.variant_id, f.location_id, 3).await;
    f.app
        .state
        .services
        .ledger
        .set_status(
            first[0].id,
            atelier_inventory::entities::inventory_item::ItemStatus::Reserved,
            None,
            None,
        )
        .await
        .unwrap();

    let response = f
        .app
        .request_authenticated(
            Method::GET,
            &format!(
                "/api/inventory/items?location_id={}&status=available",
                f.location_id
            ),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = f
        .app
        .request_authenticated(Method::GET, "/api/inventory/items?limit=2&offset=0", None)
        .await;
    let page_one = read_json(response).await;
    let response = f
        .app
        .request_authenticated(Method::GET, "/api/inventory/items?limit=2&offset=2", None)
        .await;
    let page_two = read_json(response).await;
    assert_eq!(page_one["data"].as_array().unwrap().len(), 2);
    assert_eq!(page_two["data"].as_array().unwrap().len(), 1);
    assert_ne!(page_one["data"][0]["id"], page_two["data"][0]["id"]);
    assert_ne!(page_one["data"][1]["id"], page_two["data"][0]["id"]);
}
