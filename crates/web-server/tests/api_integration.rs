//! Integration tests for the reseller endpoints, run against the in-memory repository.

use analytics::AnalyticsEngine;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{LineItem, Order, OrderStatus, PaymentStatus, Product, Role, Store};
use database::InMemoryRepository;
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use web_server::{AppState, SessionClaims, SessionVerifier, build_router};

const TEST_SECRET: &[u8] = b"integration-test-secret";

struct TestApp {
    router: Router,
    repo: Arc<InMemoryRepository>,
    reseller: Uuid,
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()
}

async fn test_app(settings: Value) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let reseller = Uuid::new_v4();
    let created = fixed_now() - Duration::days(90);
    repo.insert_store(Store {
        id: Uuid::new_v4(),
        reseller_id: reseller,
        name: "Test Store".to_string(),
        settings: serde_json::from_value(settings).unwrap(),
        created_at: created,
        updated_at: created,
    })
    .await;

    let state = AppState::new(
        repo.clone(),
        SessionVerifier::new(TEST_SECRET, "session"),
        AnalyticsEngine::default(),
        30,
    )
    .with_clock(Arc::new(fixed_now));

    TestApp {
        router: build_router(Arc::new(state)),
        repo,
        reseller,
    }
}

fn session(user: Uuid, role: Role) -> String {
    let claims = SessionClaims {
        sub: user.to_string(),
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn completed_order(
    reseller: Uuid,
    customer: Uuid,
    at: DateTime<Utc>,
    total: Decimal,
    cost: Decimal,
    items: Vec<LineItem>,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        order_number: format!("ORD-{}", Uuid::new_v4().simple()),
        customer_id: customer,
        reseller_id: Some(reseller),
        items,
        total,
        cost,
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        payment: None,
        created_at: at,
        updated_at: at,
    }
}

fn markup_settings() -> Value {
    json!({"minimumMarkup": 5, "maximumMarkup": 50, "defaultMarkup": 20})
}

#[tokio::test]
async fn unauthenticated_requests_never_reach_the_repository() {
    let app = test_app(markup_settings()).await;

    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            None,
            Some(json!({"settings": {"defaultMarkup": 10}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.repo.call_count(), 0);
}

#[tokio::test]
async fn non_reseller_sessions_are_unauthorized() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Customer);

    let (status, _) = send(&app, request(Method::GET, "/api/reseller/store", Some(&token), None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.repo.call_count(), 0);
}

#[tokio::test]
async fn reseller_without_store_gets_not_found() {
    let app = test_app(markup_settings()).await;
    let token = session(Uuid::new_v4(), Role::Reseller);

    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Store not found");

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            Some(&token),
            Some(json!({"settings": {"notifyByEmail": true}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn single_completed_order_produces_one_chart_point() {
    let app = test_app(markup_settings()).await;
    let customer = Uuid::new_v4();
    let jan5 = Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap();
    app.repo
        .insert_order(completed_order(app.reseller, customer, jan5, dec!(100), dec!(40), vec![]))
        .await;
    let mut pending = completed_order(app.reseller, customer, jan5, dec!(500), dec!(0), vec![]);
    pending.status = OrderStatus::Pending;
    app.repo.insert_order(pending).await;

    let token = session(app.reseller, Role::Reseller);
    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["chartData"],
        json!([{"date": "2024-01-05", "revenue": 100.0, "profit": 60.0, "orders": 1, "customers": 1}])
    );
    assert_eq!(body["overview"]["growth"]["revenue"], json!(100.0));
    assert_eq!(body["overview"]["currentMonth"]["orders"], json!(1));
    assert_eq!(body["overview"]["currentMonth"]["profit"], json!(60.0));
}

#[tokio::test]
async fn growth_compares_against_the_previous_window() {
    let app = test_app(markup_settings()).await;
    let customer = Uuid::new_v4();
    let current = fixed_now() - Duration::days(3);
    let previous = fixed_now() - Duration::days(45);
    let too_old = fixed_now() - Duration::days(75);
    for (at, total) in [(current, dec!(100)), (previous, dec!(80)), (too_old, dec!(1000))] {
        app.repo
            .insert_order(completed_order(app.reseller, customer, at, total, dec!(0), vec![]))
            .await;
    }

    let token = session(app.reseller, Role::Reseller);
    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overview"]["growth"]["revenue"], json!(25.0));
    assert_eq!(body["overview"]["growth"]["orders"], json!(0.0));
    assert_eq!(body["chartData"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn top_products_are_limited_and_ranked() {
    let app = test_app(markup_settings()).await;
    let at = fixed_now() - Duration::days(1);
    let mut items = Vec::new();
    for i in 1..=7 {
        let product = Product {
            id: Uuid::new_v4(),
            title: format!("Product {i}"),
        };
        items.push(LineItem::new(product.id, 2, Decimal::from(i * 10), "Standard").unwrap());
        app.repo.insert_product(product).await;
    }
    app.repo
        .insert_order(completed_order(app.reseller, Uuid::new_v4(), at, dec!(560), dec!(100), items))
        .await;

    let token = session(app.reseller, Role::Reseller);
    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;

    assert_eq!(status, StatusCode::OK);
    let products = body["topProducts"].as_array().unwrap();
    assert_eq!(products.len(), 5);
    assert_eq!(products[0], json!({"title": "Product 7", "totalSales": 2, "revenue": 140.0}));
    let revenues: Vec<f64> = products.iter().map(|p| p["revenue"].as_f64().unwrap()).collect();
    assert!(revenues.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn out_of_bounds_markup_is_rejected_and_not_saved() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Reseller);

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            Some(&token),
            Some(json!({"settings": {"defaultMarkup": 60}})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("5%"), "{message}");
    assert!(message.contains("50%"), "{message}");

    let (_, store) = send(&app, request(Method::GET, "/api/reseller/store", Some(&token), None)).await;
    assert_eq!(store["settings"]["defaultMarkup"], json!(20));
}

#[tokio::test]
async fn unrelated_settings_merge_over_existing_ones() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Reseller);

    let (status, store) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            Some(&token),
            Some(json!({"settings": {"notifyByEmail": true}})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store["settings"]["notifyByEmail"], json!(true));
    assert_eq!(store["settings"]["defaultMarkup"], json!(20));
    assert_eq!(store["reseller"], json!(app.reseller));
    assert_eq!(store["name"], "Test Store");
}

#[tokio::test]
async fn repeating_a_valid_patch_is_idempotent() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Reseller);
    let patch = json!({"settings": {"defaultMarkup": 35, "currency": "EUR"}});

    let (first_status, first) = send(
        &app,
        request(Method::PATCH, "/api/reseller/store/settings", Some(&token), Some(patch.clone())),
    )
    .await;
    let (second_status, second) = send(
        &app,
        request(Method::PATCH, "/api/reseller/store/settings", Some(&token), Some(patch)),
    )
    .await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["settings"], second["settings"]);
    assert_eq!(second["settings"]["defaultMarkup"], json!(35));
}

#[tokio::test]
async fn malformed_settings_body_is_a_validation_error() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Reseller);

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            Some(&token),
            Some(json!({"settings": "not an object"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn store_faults_surface_as_generic_internal_errors() {
    let app = test_app(markup_settings()).await;
    app.repo.set_unavailable(true);
    let token = session(app.reseller, Role::Reseller);

    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "An internal database error occurred"}));
}

#[tokio::test]
async fn overflowing_sales_totals_are_an_internal_error() {
    let app = test_app(markup_settings()).await;
    let at = fixed_now() - Duration::days(2);
    let half = Decimal::MAX / dec!(2) + dec!(1);
    for _ in 0..2 {
        app.repo
            .insert_order(completed_order(app.reseller, Uuid::new_v4(), at, half, dec!(0), vec![]))
            .await;
    }
    let token = session(app.reseller, Role::Reseller);

    let (status, body) = send(&app, request(Method::GET, "/api/reseller/analytics", Some(&token), None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "An internal database error occurred"}));
}

#[tokio::test]
async fn oversized_settings_body_keeps_payload_too_large() {
    let app = test_app(markup_settings()).await;
    let token = session(app.reseller, Role::Reseller);
    let blob = "x".repeat(2 * 1024 * 1024);

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/api/reseller/store/settings",
            Some(&token),
            Some(json!({"settings": {"blob": blob}})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());

    let (_, store) = send(&app, request(Method::GET, "/api/reseller/store", Some(&token), None)).await;
    assert!(store["settings"].get("blob").is_none());
}

#[tokio::test]
async fn dashboard_pages_are_served() {
    let app = test_app(markup_settings()).await;

    for uri in ["/reseller/analytics", "/reseller/settings"] {
        let response = app
            .router
            .clone()
            .oneshot(request(Method::GET, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
    }
}
