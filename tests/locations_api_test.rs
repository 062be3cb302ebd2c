mod common;

use atelier_inventory::entities::location::LocationType;
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_list_and_get_locations() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/locations",
            Some(json!({
                "name": "Via Tortona Store",
                "type": "store",
                "city": "Milan",
                "country": "IT"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["type"], "store");
    assert_eq!(body["data"]["is_active"], true);
    let store_id = body["data"]["id"].as_str().unwrap().to_string();

    app.seed_location("Central Warehouse", LocationType::Warehouse)
        .await;
    app.seed_location("Web Shop", LocationType::Online).await;

    let response = app
        .request_authenticated(Method::GET, "/api/locations", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let types: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["type"].as_str().unwrap())
        .collect();
    let mut sorted = types.clone();
    sorted.sort();
    assert_eq!(types, sorted, "locations are ordered by type");

    let response = app
        .request_authenticated(Method::GET, &format!("/api/locations/{}", store_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["name"], "Via Tortona Store");
}

#[tokio::test]
async fn blank_name_and_unknown_type_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/locations",
            Some(json!({ "name": "   ", "type": "store" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/locations",
            Some(json!({ "name": "Popup", "type": "kiosk" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_active_name_conflicts_until_deactivated() {
    let app = TestApp::new().await;
    let first = app.seed_location("Brera Store", LocationType::Store).await;

    let payload = json!({ "name": "Brera Store", "type": "store" });
    let response = app
        .request_authenticated(Method::POST, "/api/locations", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/locations/{}/deactivate", first.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["is_active"], false);

    let response = app
        .request_authenticated(Method::POST, "/api/locations", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn update_changes_fields_and_missing_location_is_404() {
    let app = TestApp::new().await;
    let location = app.seed_location("Outlet", LocationType::Store).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/locations/{}", location.id),
            Some(json!({ "name": "Serravalle Outlet", "city": "Serravalle Scrivia" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["name"], "Serravalle Outlet");
    assert_eq!(body["data"]["city"], "Serravalle Scrivia");
    assert_eq!(body["data"]["country"], "IT");

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/locations/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn list_filters_and_search_skip_inactive() {
    let app = TestApp::new().await;
    app.seed_location("Milan Warehouse", LocationType::Warehouse)
        .await;
    let closed = app.seed_location("Milan Store", LocationType::Store).await;
    app.state
        .services
        .locations
        .deactivate_location(closed.id)
        .await
        .unwrap();

    let response = app
        .request_authenticated(Method::GET, "/api/locations?active=true", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request_authenticated(Method::GET, "/api/locations?type=store", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["is_active"], false);

    let response = app
        .request_authenticated(Method::GET, "/api/locations/search?name=Milan", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Milan Warehouse"]);
}

#[tokio::test]
async fn delete_is_blocked_while_items_reference_the_location() {
    let app = TestApp::new().await;
    let product = app.seed_product("Linen Shirt").await;
    let variant = app.seed_variant(product.id, "LS-WHT-M").await;
    let stocked = app.seed_location("Stocked", LocationType::Warehouse).await;
    let empty = app.seed_location("Empty", LocationType::Store).await;
    app.seed_items(variant.id, stocked.id, 2).await;

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/locations/{}", stocked.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/locations/{}/deactivate", stocked.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/locations/{}", empty.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/locations/{}", empty.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_summary_for_one_location() {
    let app = TestApp::new().await;
    let product = app.seed_product("Wool Coat").await;
    let variant = app.seed_variant(product.id, "WC-CML-L").await;
    let warehouse = app.seed_location("North", LocationType::Warehouse).await;
    let store = app.seed_location("South", LocationType::Store).await;
    app.seed_items(variant.id, warehouse.id, 4).await;
    app.seed_items(variant.id, store.id, 1).await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/locations/{}/inventory-summary", warehouse.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["available_count"], 4);
    assert_eq!(rows[0]["location_name"], "North");

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/locations/{}/inventory-summary", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
