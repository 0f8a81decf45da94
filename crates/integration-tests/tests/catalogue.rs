//! Seller-owned categories and products.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use marketplace_integration_tests::TestApp;

async fn category(app: &TestApp, token: &str, name: &str) -> i64 {
    let (status, body) = app
        .post("/seller/categories", Some(token), json!({ "name": name }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["category"]["id"].as_i64().unwrap()
}

async fn product(app: &TestApp, token: &str, category_id: i64, name: &str) -> Value {
    let (status, body) = app
        .post(
            "/seller/products",
            Some(token),
            json!({
                "name": name,
                "price": 500,
                "category_id": category_id,
                "stock": 10,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["product"].clone()
}

#[tokio::test]
async fn only_the_owner_can_update_a_product() {
    let app = TestApp::new();
    let seller1 = app.seller("s1@example.com", "08030000001").await;
    let seller2 = app.seller("s2@example.com", "08030000002").await;

    let electronics = category(&app, &seller1, "Electronics").await;
    let phone = product(&app, &seller1, electronics, "Phone").await;
    let id = phone["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"].as_f64(), Some(500.0));
    assert_eq!(body["product"]["stock"], 10);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/seller/products/{id}"),
            Some(&seller2),
            Some(json!({
                "name": "Stolen",
                "price": 1,
                "category_id": electronics,
                "stock": 0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let (_, body) = app.get(&format!("/products/{id}"), None).await;
    assert_eq!(body["product"]["name"], "Phone");
    assert_eq!(body["product"]["price"].as_f64(), Some(500.0));

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/seller/products/{id}"),
            Some(&seller1),
            Some(json!({ "stock": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["stock"], 3);
    assert_eq!(body["product"]["name"], "Phone");
}

#[tokio::test]
async fn buyers_cannot_use_seller_routes() {
    let app = TestApp::new();
    let buyer = app.register("buyer@example.com", "08030000003").await;

    let (status, body) = app
        .post("/seller/categories", Some(&buyer), json!({ "name": "Books" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "authorization failed");

    let (status, _) = app.get("/seller/products", Some(&buyer)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/products", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn category_delete_is_blocked_while_products_remain() {
    let app = TestApp::new();
    let seller = app.seller("s1@example.com", "08030000001").await;
    let electronics = category(&app, &seller, "Electronics").await;
    let phone = product(&app, &seller, electronics, "Phone").await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/seller/categories/{electronics}"),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete category");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/seller/products/{}", phone["id"]),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/seller/categories/{electronics}"),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category deleted successfully");

    let (status, _) = app.get(&format!("/categories/{electronics}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_reports_total_beyond_the_page() {
    let app = TestApp::new();
    let seller = app.seller("s1@example.com", "08030000001").await;
    let electronics = category(&app, &seller, "Electronics").await;
    for name in ["Phone", "Tablet", "Laptop"] {
        product(&app, &seller, electronics, name).await;
    }

    let (status, body) = app.get("/products?take=2&skip=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Products retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["take"], 2);

    let (_, body) = app.get("/products?take=2&skip=2", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/products?search=tab", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Tablet");

    let (_, body) = app.get("/products?take=0", None).await;
    assert_eq!(body["pagination"]["take"], 10);
}

#[tokio::test]
async fn sub_categories_filter_by_parent() {
    let app = TestApp::new();
    let seller = app.seller("s1@example.com", "08030000001").await;
    let electronics = category(&app, &seller, "Electronics").await;

    let (status, _) = app
        .post(
            "/seller/categories",
            Some(&seller),
            json!({ "name": "Phones", "parent_id": electronics }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .get(&format!("/categories?parent_id={electronics}"), None)
        .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Phones");
}

#[tokio::test]
async fn unknown_category_is_a_bad_request() {
    let app = TestApp::new();
    let seller = app.seller("s1@example.com", "08030000001").await;

    let (status, body) = app
        .post(
            "/seller/products",
            Some(&seller),
            json!({ "name": "Phone", "price": 500, "category_id": 999, "stock": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category");
}

#[tokio::test]
async fn product_fields_are_validated() {
    let app = TestApp::new();
    let seller = app.seller("s1@example.com", "08030000001").await;
    let electronics = category(&app, &seller, "Electronics").await;

    let (status, body) = app
        .post(
            "/seller/products",
            Some(&seller),
            json!({ "name": "Phone", "price": 0, "category_id": electronics }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Field 'price' must be greater than 0");

    let (status, body) = app
        .post(
            "/seller/categories",
            Some(&seller),
            json!({ "name": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Field 'name' is required");
}

#[tokio::test]
async fn malformed_ids_and_dates_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/products/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid product ID");

    let (status, body) = app.get("/categories?beginning=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid beginning date format")
    );

    let (status, _) = app
        .get("/products?beginning=2024-01-01T00:00:00Z", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
