use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, TransactionTrait};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, SaltedSha256};
use migration::MigratorTrait;
use server::ServerOptions;
use uuid::Uuid;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .hasher(SaltedSha256::with_rounds(1))
        .build()
        .await
        .unwrap();
    server::app(Arc::new(engine), &ServerOptions::default())
}

/// File-backed app with a short request deadline.
async fn test_app_on_file(
    request_timeout: Duration,
) -> (Router, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!("server_{}.db", Uuid::new_v4()));

    let db = Database::connect(format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .hasher(SaltedSha256::with_rounds(1))
        .build()
        .await
        .unwrap();
    let options = ServerOptions {
        request_timeout,
        ..ServerOptions::default()
    };
    (server::app(Arc::new(engine), &options), db, path)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let res = send_raw(app, method, uri, token, body).await;
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register and log in; returns (user id, token).
async fn signup(app: &Router, name: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": name, "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["user_id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "user_id": user_id, "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (user_id, body["token"].as_str().unwrap().to_string())
}

async fn new_item(app: &Router, token: &str, name: &str, price: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/items",
        Some(token),
        Some(json!({
            "name": name,
            "price": price,
            "description": "good condition",
            "category_id": 1,
            "image": "/9j/4A==",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["item_id"].as_i64().unwrap()
}

async fn put_on_sale(app: &Router, token: &str, item_id: i64) {
    let (status, _) = send(
        app,
        Method::POST,
        "/sell",
        Some(token),
        Some(json!({ "item_id": item_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/balance", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/balance", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/purchase/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app().await;
    let (user_id, _) = signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "user_id": user_id, "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app().await;
    let (_, token) = signup(&app, "alice").await;

    let (status, _) = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/balance", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profiles_hide_balances() {
    let app = test_app().await;
    let (user_id, _) = signup(&app, "  alice ").await;

    let (status, body) = send(&app, Method::GET, &format!("/users/{user_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");
    assert!(body.get("balance").is_none());

    let (status, _) = send(&app, Method::GET, "/users/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_are_public() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"][0]["name"], "fashion");
}

#[tokio::test]
async fn purchase_flow_over_http() {
    let app = test_app().await;
    let (seller_id, seller) = signup(&app, "seller").await;
    let (buyer_id, buyer) = signup(&app, "buyer").await;

    let item_id = new_item(&app, &seller, "lamp", 100).await;

    let (status, body) = send(&app, Method::GET, &format!("/items/{item_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "initial");
    assert_eq!(body["seller_id"], seller_id);
    assert_eq!(body["category_name"], "fashion");

    let res = send_raw(
        &app,
        Method::GET,
        &format!("/items/{item_id}/image"),
        None,
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &[0xFF, 0xD8, 0xFF, 0xE0]);

    put_on_sale(&app, &seller, item_id).await;
    let (_, listing) = send(&app, Method::GET, "/items", None, None).await;
    assert_eq!(listing["items"][0]["id"], item_id);
    assert_eq!(listing["items"][0]["status"], "on_sale");

    let (status, body) = send(
        &app,
        Method::POST,
        "/balance",
        Some(&buyer),
        Some(json!({ "amount": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 150);

    let (status, sale) = send(
        &app,
        Method::POST,
        &format!("/purchase/{item_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["item_id"], item_id);
    assert_eq!(sale["buyer_id"], buyer_id);
    assert_eq!(sale["seller_id"], seller_id);
    assert_eq!(sale["price"], 100);

    let (_, body) = send(&app, Method::GET, "/balance", Some(&buyer), None).await;
    assert_eq!(body["balance"], 50);
    let (_, body) = send(&app, Method::GET, "/balance", Some(&seller), None).await;
    assert_eq!(body["balance"], 100);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/purchase/{item_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let (_, body) = send(&app, Method::GET, "/purchases", Some(&buyer), None).await;
    assert_eq!(body["sales"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/users/{seller_id}/items"),
        None,
        None,
    )
    .await;
    assert_eq!(body["items"][0]["status"], "sold_out");
}

#[tokio::test]
async fn trading_errors_map_to_distinct_statuses() {
    let app = test_app().await;
    let (_, seller) = signup(&app, "seller").await;
    let (_, buyer) = signup(&app, "buyer").await;
    let item_id = new_item(&app, &seller, "lamp", 100).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/sell",
        Some(&buyer),
        Some(json!({ "item_id": item_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    put_on_sale(&app, &seller, item_id).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/purchase/{item_id}"),
        Some(&seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/purchase/{item_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (status, _) = send(&app, Method::POST, "/purchase/9999", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/balance",
        Some(&buyer),
        Some(json!({ "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_validation_over_http() {
    let app = test_app().await;
    let (_, seller) = signup(&app, "seller").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/items",
        Some(&seller),
        Some(json!({ "name": "lamp", "price": 10, "category_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/items",
        Some(&seller),
        Some(json!({ "name": "lamp", "price": 10, "category_id": 1, "image": "***" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid base64 image")
    );

    let item_id = new_item(&app, &seller, "lamp", 10).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/items/{item_id}"),
        Some(&seller),
        Some(json!({ "name": "desk lamp", "price": 12, "category_id": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_id"], item_id);

    let (_, body) = send(&app, Method::GET, &format!("/items/{item_id}"), None, None).await;
    assert_eq!(body["name"], "desk lamp");
    assert_eq!(body["category_id"], 2);
}

#[tokio::test]
async fn search_finds_on_sale_items() {
    let app = test_app().await;
    let (_, seller) = signup(&app, "seller").await;
    let lamp = new_item(&app, &seller, "Desk Lamp", 10).await;
    let _chair = new_item(&app, &seller, "Chair", 10).await;
    put_on_sale(&app, &seller, lamp).await;

    let (status, body) = send(&app, Method::GET, "/search?name=lamp", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], lamp);
}

#[tokio::test]
async fn favorites_over_http() {
    let app = test_app().await;
    let (_, seller) = signup(&app, "seller").await;
    let (_, fan) = signup(&app, "fan").await;
    let item_id = new_item(&app, &seller, "lamp", 10).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/favorites/folders",
        Some(&fan),
        Some(json!({ "name": "wishlist" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let folder_id = body["folder_id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/favorites",
        Some(&fan),
        Some(json!({ "item_id": item_id, "folder_id": folder_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/favorites/folders", Some(&fan), None).await;
    assert_eq!(body["folders"][0]["name"], "wishlist");

    let items_uri = format!("/favorites/folders/{folder_id}/items");
    let (_, body) = send(&app, Method::GET, &items_uri, Some(&fan), None).await;
    assert_eq!(body["items"][0]["id"], item_id);

    let (status, _) = send(&app, Method::GET, &items_uri, Some(&seller), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let remove_uri = format!("/favorites/folders/{folder_id}/items/{item_id}");
    let (status, _) = send(&app, Method::DELETE, &remove_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &remove_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_purchase_is_rolled_back() {
    let (app, db, path) = test_app_on_file(Duration::from_millis(200)).await;
    let (seller_id, seller) = signup(&app, "seller").await;
    let (_, buyer) = signup(&app, "buyer").await;
    let item_id = new_item(&app, &seller, "lamp", 100).await;
    put_on_sale(&app, &seller, item_id).await;
    send(
        &app,
        Method::POST,
        "/balance",
        Some(&buyer),
        Some(json!({ "amount": 150 })),
    )
    .await;

    // Another writer holds the lock past the request deadline.
    let blocker = db.begin().await.unwrap();
    blocker
        .execute_unprepared("INSERT INTO categories (name) VALUES ('held')")
        .await
        .unwrap();

    let purchase_uri = format!("/purchase/{item_id}");
    let res = send_raw(&app, Method::POST, &purchase_uri, Some(&buyer), None).await;
    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    blocker.rollback().await.unwrap();

    let (_, body) = send(&app, Method::GET, &format!("/items/{item_id}"), None, None).await;
    assert_eq!(body["status"], "on_sale");
    let (_, body) = send(&app, Method::GET, "/balance", Some(&buyer), None).await;
    assert_eq!(body["balance"], 150);
    let (_, body) = send(&app, Method::GET, "/balance", Some(&seller), None).await;
    assert_eq!(body["balance"], 0);
    let (_, body) = send(&app, Method::GET, "/purchases", Some(&buyer), None).await;
    assert!(body["sales"].as_array().unwrap().is_empty());

    let (status, sale) = send(&app, Method::POST, &purchase_uri, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["seller_id"], seller_id);

    drop(app);
    drop(db);
    let _ = std::fs::remove_file(path);
}
