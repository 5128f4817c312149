//! HTTP surface tests through the router with `tower::ServiceExt::oneshot`

mod helpers;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v2/auth/register",
            json!({"username": username, "password": "moonlight"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = helpers::app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reference_data() {
    let app = helpers::app().await;

    let (status, body) = send(&app, get("/api/v1/dynasties")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 9);

    let (_, body) = send(&app, get("/api/v1/categories")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_list_poems_with_paging() {
    let app = helpers::app().await;

    let (status, body) = send(&app, get("/api/v1/poems?page=2&page_size=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 14);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);

    let (_, body) = send(&app, get("/api/v1/poems?pageSize=500&category=quantangshi")).await;
    assert_eq!(body["data"]["page_size"], 100);
    assert_eq!(body["data"]["total"], 7);
}

#[tokio::test]
async fn test_poem_lookup() {
    let app = helpers::app().await;

    let (status, body) = send(&app, get("/api/v1/poems/tang-libai-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "静夜思");

    let (status, body) = send(&app, get("/api/v1/poems/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 404);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_random_poems() {
    let app = helpers::app().await;
    let (status, body) = send(&app, get("/api/v1/poems/random?count=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_authors() {
    let app = helpers::app().await;

    let (_, body) = send(&app, get("/api/v1/authors?dynasty=tang")).await;
    assert_eq!(body["data"]["total"], 4);

    let name = "%E6%9D%8E%E7%99%BD"; // 李白
    let (status, body) = send(&app, get(&format!("/api/v1/authors/{}", name))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["poem_count"], 3);

    let (_, body) = send(&app, get(&format!("/api/v1/authors/{}/poems", name))).await;
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn test_search() {
    let app = helpers::app().await;

    let (status, body) = send(&app, get("/api/v1/search?q=%E6%9D%8E%E7%99%BD")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["query"], "李白");
    assert_eq!(body["data"]["total"], 4);
    assert!(body["data"]["duration_ms"].is_number());

    let (status, _) = send(&app, get("/api/v1/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, get("/api/v1/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = helpers::app().await;
    register(&app, "libai").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v2/auth/register",
            json!({"username": "libai", "password": "moonlight"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v2/auth/login",
            json!({"username": "libai", "password": "moonlight"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"].get("password_hash").is_none());

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v2/auth/login",
            json!({"username": "libai", "password": "wrong-password"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_too_early() {
    let app = helpers::app().await;
    let token = register(&app, "libai").await;

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/api/v2/auth/refresh", json!({"token": token}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = helpers::app().await;

    let (status, body) = send(&app, get("/api/v2/users/profile")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = send(&app, authed_get("/api/v2/users/profile", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_and_favorites_flow() {
    let app = helpers::app().await;
    let token = register(&app, "libai").await;

    let (status, body) = send(&app, authed_get("/api/v2/users/profile", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "libai");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v2/users/profile",
            json!({"nickname": "谪仙人", "province": ""}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "谪仙人");

    let (status, body) = send(&app, get(&format!("/api/v2/users/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "谪仙人");
    assert!(body["data"].get("email").is_none());

    let favorite = json!({"kind": "poem", "id": "tang-libai-1"});
    let (status, _) = send(
        &app,
        json_request(Method::POST, "/api/v2/users/favorites", favorite.clone(), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, authed_get("/api/v2/users/favorites?kind=poem", &token)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["target"], favorite);

    let (status, _) = send(&app, authed_get("/api/v2/users/favorites?kind=dynasty", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v2/users/favorites?kind=poem&id=tang-libai-1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, authed_get("/api/v2/users/favorites", &token)).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v2/users/history",
            json!({"kind": "author", "id": "李白"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = send(&app, authed_get("/api/v2/users/history", &token)).await;
    assert_eq!(body["data"]["total"], 1);
}
