//! HTTP tests for the quote endpoints: auth before validation, atomic
//! creation, owner scoping and the guest-quote policy.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, test_config, Backend, TestApp, TEST_USER};
use serde_json::json;

use ayak_api::models::{NewProduct, ProductFilter};

async fn seed_products(app: &TestApp, count: usize) -> Vec<i32> {
    let mut ids = Vec::with_capacity(count);
    for n in 0..count {
        let product = app
            .storage()
            .create_product(NewProduct::new(
                format!("Product {}", n),
                "Seeded for tests",
                "https://img.example/p.jpg",
            ))
            .await
            .expect("create product");
        ids.push(product.id);
    }
    ids
}

#[tokio::test]
async fn unauthenticated_submission_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let ids = seed_products(&app, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/quotes",
            Some(json!({ "items": [{ "productId": ids[0], "quantity": 2 }] })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Unauthorized");

    assert!(app.storage().get_quotes(TEST_USER).await.unwrap().is_empty());
    assert!(app.storage().get_quote(1).await.unwrap().is_none());
}

#[tokio::test]
async fn unauthenticated_invalid_body_is_still_401() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::POST, "/api/quotes", Some(json!({ "items": [] })), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_401() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/quotes", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submission_creates_one_header_and_ordered_items() {
    for backend in [Backend::Memory, Backend::Sqlite] {
        let app = TestApp::with_backend(backend).await;
        let ids = seed_products(&app, 3).await;

        let response = app
            .request_authenticated(
                Method::POST,
                "/api/quotes",
                Some(json!({
                    "items": [
                        { "productId": ids[2], "quantity": 4, "customizationNotes": "walnut" },
                        { "productId": ids[0], "quantity": 1 },
                        { "productId": ids[1] }
                    ]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "{:?}", backend);

        let quote = response_json(response).await;
        assert_eq!(quote["status"], "pending");
        assert_eq!(quote["userId"], TEST_USER);
        assert!(quote.get("items").is_none(), "header only");

        let quote_id = quote["id"].as_i64().unwrap() as i32;
        let items = app.storage().get_quote_items(quote_id).await.unwrap();
        let shape: Vec<_> = items
            .iter()
            .map(|i| (i.product_id, i.quantity, i.customization_notes.clone()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (ids[2], 4, Some("walnut".to_string())),
                (ids[0], 1, None),
                (ids[1], 1, None),
            ]
        );
        assert_eq!(app.storage().get_quotes(TEST_USER).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn validation_errors_report_first_failure() {
    let app = TestApp::new().await;

    let cases = [
        (json!({ "items": [] }), "items: at least one item is required"),
        (
            json!({ "items": [{ "productId": 1, "quantity": 0 }] }),
            "items: [0].quantity: quantity must be at least 1",
        ),
    ];
    for (body, expected) in cases {
        let response = app
            .request_authenticated(Method::POST, "/api/quotes", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["message"], expected);
    }

    for body in [json!({}), json!({ "items": [{ "productId": "seven" }] })] {
        let response = app
            .request_authenticated(Method::POST, "/api/quotes", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["error"], "Bad Request");
    }

    let token = app.token().to_string();
    let response = app
        .request_raw(Method::POST, "/api/quotes", Some("{not json"), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.storage().get_quotes(TEST_USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_product_rolls_back() {
    for backend in [Backend::Memory, Backend::Sqlite] {
        let app = TestApp::with_backend(backend).await;
        let ids = seed_products(&app, 1).await;

        let response = app
            .request_authenticated(
                Method::POST,
                "/api/quotes",
                Some(json!({
                    "items": [
                        { "productId": ids[0], "quantity": 1 },
                        { "productId": 9999, "quantity": 1 }
                    ]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", backend);
        assert_eq!(
            response_json(response).await["message"],
            "items: productId does not reference an existing product"
        );
        assert!(app.storage().get_quotes(TEST_USER).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn listing_is_scoped_and_newest_first() {
    let app = TestApp::new().await;
    let ids = seed_products(&app, 1).await;
    let item = json!({ "items": [{ "productId": ids[0], "quantity": 1 }] });

    let mut created = Vec::new();
    for _ in 0..3 {
        let response = app
            .request_authenticated(Method::POST, "/api/quotes", Some(item.clone()))
            .await;
        created.push(response_json(response).await["id"].as_i64().unwrap());
    }
    let other = app.token_for("user-2");
    app.request(Method::POST, "/api/quotes", Some(item), Some(&other))
        .await;

    let response = app
        .request_authenticated(Method::GET, "/api/quotes", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<i64> = response_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    created.reverse();
    assert_eq!(listed, created);

    let response = app.request(Method::GET, "/api/quotes", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn quote_detail_is_owner_only() {
    let app = TestApp::new().await;
    let ids = seed_products(&app, 2).await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/quotes",
            Some(json!({ "items": [
                { "productId": ids[0], "quantity": 2 },
                { "productId": ids[1], "quantity": 1 }
            ] })),
        )
        .await;
    let id = response_json(response).await["id"].as_i64().unwrap();
    let uri = format!("/api/quotes/{}", id);

    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = response_json(response).await;
    assert_eq!(detail["id"], id);
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);
    assert_eq!(detail["items"][0]["productId"], ids[0]);

    let other = app.token_for("user-2");
    let response = app.request(Method::GET, &uri, None, Some(&other)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["message"], "Quote not found");

    let response = app
        .request_authenticated(Method::GET, "/api/quotes/abc", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guest_quotes_when_enabled() {
    let mut config = test_config();
    config.allow_guest_quotes = true;
    let app = TestApp::with_config(Backend::Memory, config).await;
    let ids = seed_products(&app, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/quotes",
            Some(json!({ "items": [{ "productId": ids[0], "quantity": 3 }] })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let quote = response_json(response).await;
    assert!(quote["userId"].is_null());
    let uri = format!("/api/quotes/{}", quote["id"]);

    // Guests can read guest quotes but have nothing to list.
    let response = app.request(Method::GET, "/api/quotes", None, None).await;
    assert_eq!(response_json(response).await, json!([]));
    let response = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // A signed-in user cannot see a guest quote.
    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Validation still applies to guests.
    let response = app
        .request(Method::POST, "/api/quotes", Some(json!({ "items": [] })), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/quotes", None, None).await;
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = response_json(response).await;
    assert_eq!(body["requestId"], header);
}

#[tokio::test]
async fn products_are_untouched_by_failed_quotes() {
    let app = TestApp::new().await;
    seed_products(&app, 2).await;
    app.request(Method::POST, "/api/quotes", Some(json!({ "items": [] })), None)
        .await;
    let products = app
        .storage()
        .get_products(&ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(products.len(), 2);
}
