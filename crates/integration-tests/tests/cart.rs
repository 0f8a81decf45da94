//! Cart lines for an authenticated user.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use marketplace_integration_tests::TestApp;

/// A seller with one product; returns the product id.
async fn listed_product(app: &TestApp) -> i64 {
    let seller = app.seller("seller@example.com", "08030000001").await;
    let (_, body) = app
        .post(
            "/seller/categories",
            Some(&seller),
            json!({ "name": "Electronics" }),
        )
        .await;
    let category = body["category"]["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            "/seller/products",
            Some(&seller),
            json!({ "name": "Phone", "price": 500, "category_id": category, "stock": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["product"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn adding_twice_merges_the_line() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let buyer = app.register("buyer@example.com", "08030000002").await;

    let (status, body) = app
        .post("/cart", Some(&buyer), json!({ "product_id": product, "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cart_item"]["quantity"], 2);
    assert_eq!(body["cart_item"]["name"], "Phone");
    assert_eq!(body["cart_item"]["price"].as_f64(), Some(500.0));

    let (status, body) = app
        .post("/cart", Some(&buyer), json!({ "product_id": product, "quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cart_item"]["quantity"], 5);

    let (_, body) = app.get("/cart", Some(&buyer)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["quantity"], 5);
}

#[tokio::test]
async fn add_needs_a_known_product() {
    let app = TestApp::new();
    let buyer = app.register("buyer@example.com", "08030000002").await;

    let (status, body) = app.post("/cart", Some(&buyer), json!({ "quantity": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Field 'product_id' is required");

    let (status, _) = app
        .post("/cart", Some(&buyer), json!({ "product_id": 42 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn decrement_stops_at_one() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let buyer = app.register("buyer@example.com", "08030000002").await;
    app.post("/cart", Some(&buyer), json!({ "product_id": product }))
        .await;

    let (status, body) = app
        .post(&format!("/cart/{product}/increment"), Some(&buyer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_item"]["quantity"], 2);

    let (status, body) = app
        .post(&format!("/cart/{product}/decrement"), Some(&buyer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_item"]["quantity"], 1);

    let (status, _) = app
        .post(&format!("/cart/{product}/decrement"), Some(&buyer), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/cart/{product}"), Some(&buyer)).await;
    assert_eq!(body["cart_item"]["quantity"], 1);
}

#[tokio::test]
async fn quantity_is_capped() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let buyer = app.register("buyer@example.com", "08030000002").await;

    let (status, body) = app
        .post(
            "/cart",
            Some(&buyer),
            json!({ "product_id": product, "quantity": i32::MAX }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["message"], "quantity cannot exceed 10000");

    let (status, _) = app
        .post(
            "/cart",
            Some(&buyer),
            json!({ "product_id": product, "quantity": 9_999 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/cart", Some(&buyer), json!({ "product_id": product, "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&format!("/cart/{product}/increment"), Some(&buyer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_item"]["quantity"], 10_000);

    let (status, _) = app
        .post(&format!("/cart/{product}/increment"), Some(&buyer), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/cart",
            Some(&buyer),
            Some(json!({ "product_id": product, "quantity": 10_001 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/cart/{product}"), Some(&buyer)).await;
    assert_eq!(body["cart_item"]["quantity"], 10_000);
}

#[tokio::test]
async fn put_overrides_quantity_and_price() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let buyer = app.register("buyer@example.com", "08030000002").await;
    app.post("/cart", Some(&buyer), json!({ "product_id": product }))
        .await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/cart",
            Some(&buyer),
            Some(json!({ "product_id": product, "quantity": 4, "price": 450 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_item"]["quantity"], 4);
    assert_eq!(body["cart_item"]["price"].as_f64(), Some(450.0));

    let (status, _) = app
        .send(
            Method::PUT,
            "/cart",
            Some(&buyer),
            Some(json!({ "product_id": product, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn carts_are_per_user() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let ada = app.register("ada@example.com", "08030000002").await;
    let bola = app.register("bola@example.com", "08030000003").await;
    app.post("/cart", Some(&ada), json!({ "product_id": product }))
        .await;

    let (status, _) = app.get(&format!("/cart/{product}"), Some(&bola)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/cart", Some(&bola)).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn remove_and_clear() {
    let app = TestApp::new();
    let product = listed_product(&app).await;
    let buyer = app.register("buyer@example.com", "08030000002").await;
    app.post("/cart", Some(&buyer), json!({ "product_id": product }))
        .await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/cart/{product}"), Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::DELETE, &format!("/cart/{product}"), Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.post("/cart", Some(&buyer), json!({ "product_id": product }))
        .await;
    let (status, body) = app
        .send(Method::DELETE, "/cart", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);

    let (status, body) = app
        .send(Method::DELETE, "/cart", Some(&buyer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);
}
