//! End-to-end tests of the HTTP surface against the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use todo_api::{app::build_app, config::AppConfig, AppState};
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

fn test_app() -> Router {
    build_app(AppState::in_memory(Arc::new(AppConfig::for_tests())))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("x-auth", token);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Reply { status, headers, body }
}

/// Registers a user and returns (id, token).
async fn signup(app: &Router, email: &str, password: &str) -> (String, String) {
    let res = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let token = res.headers["x-auth"].to_str().unwrap().to_string();
    let id = res.json()["_id"].as_str().unwrap().to_string();
    (id, token)
}

async fn create(app: &Router, token: &str, text: &str) -> Value {
    let res = send(app, Method::POST, "/todos", Some(token), Some(json!({ "text": text }))).await;
    assert_eq!(res.status, StatusCode::OK);
    res.json()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let res = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, b"ok");
}

#[tokio::test]
async fn register_returns_public_user_and_token() {
    let app = test_app();
    let res = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "email": "user@example.com", "password": "examplePass123" })),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers.contains_key("x-auth"));
    let body = res.json();
    assert!(body["_id"].is_string());
    assert_eq!(body["email"], "user@example.com");
    assert_eq!(body.as_object().unwrap().len(), 2);
    let raw = String::from_utf8(res.body.clone()).unwrap();
    assert!(!raw.contains("examplePass123"));
    assert!(!raw.contains("argon2"));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = test_app();
    let (first_id, token) = signup(&app, "user@example.com", "examplePass123").await;

    let res = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "email": "user@example.com", "password": "examplePass123" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.headers.contains_key("x-auth"));

    // the original account is untouched
    let me = send(&app, Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(me.json()["_id"], first_id.as_str());
}

#[tokio::test]
async fn registration_validation_errors() {
    let app = test_app();
    for body in [
        json!({ "email": "not-an-email", "password": "examplePass123" }),
        json!({ "email": "", "password": "examplePass123" }),
        json!({ "email": "user@example.com", "password": "123" }),
        json!({ "email": "user@example.com" }),
    ] {
        let res = send(&app, Method::POST, "/users", None, Some(body.clone())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res.json()["error"], "validation_error");
    }
}

#[tokio::test]
async fn me_requires_token_and_returns_empty_401() {
    let app = test_app();
    let res = send(&app, Method::GET, "/users/me", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body.is_empty());

    let res = send(&app, Method::GET, "/users/me", Some("garbage"), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body.is_empty());
}

#[tokio::test]
async fn me_returns_identity_for_token() {
    let app = test_app();
    let (id, token) = signup(&app, "user@example.com", "examplePass123").await;

    let res = send(&app, Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "_id": id, "email": "user@example.com" }));
}

#[tokio::test]
async fn authorization_bearer_header_is_not_accepted() {
    let app = test_app();
    let (_, token) = signup(&app, "user@example.com", "examplePass123").await;

    let req = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_additional_working_token() {
    let app = test_app();
    let (id, first) = signup(&app, "user@example.com", "examplePass123").await;

    let res = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "User@Example.com", "password": "examplePass123" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["_id"], id.as_str());
    let second = res.headers["x-auth"].to_str().unwrap().to_string();

    for token in [&first, &second] {
        let me = send(&app, Method::GET, "/users/me", Some(token), None).await;
        assert_eq!(me.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();
    signup(&app, "user@example.com", "examplePass123").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "nope-nope" })),
    )
    .await;
    let unknown_user = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "examplePass123" })),
    )
    .await;

    for res in [wrong_password, unknown_user] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert!(res.body.is_empty());
        assert!(!res.headers.contains_key("x-auth"));
    }
}

#[tokio::test]
async fn todo_routes_require_authentication() {
    let app = test_app();
    let id = uuid::Uuid::new_v4();
    let routes = [
        (Method::POST, "/todos".to_string(), Some(json!({ "text": "x" }))),
        (Method::GET, "/todos".to_string(), None),
        (Method::GET, format!("/todos/{id}"), None),
        (Method::PATCH, format!("/todos/{id}"), Some(json!({ "completed": true }))),
        (Method::DELETE, format!("/todos/{id}"), None),
    ];
    for (method, uri, body) in routes {
        let res = send(&app, method.clone(), &uri, None, body).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(res.body.is_empty());
    }
}

#[tokio::test]
async fn create_and_list_todos() {
    let app = test_app();
    let (id, token) = signup(&app, "user@example.com", "examplePass123").await;

    let todo = create(&app, &token, "test string").await;
    assert_eq!(todo["text"], "test string");
    assert_eq!(todo["completed"], false);
    assert!(todo["completedAt"].is_null());
    assert_eq!(todo["_creator"], id.as_str());

    create(&app, &token, "Second todo").await;

    let res = send(&app, Method::GET, "/todos", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let todos = res.json()["todos"].as_array().unwrap().clone();
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0]["text"], "test string");
    assert_eq!(todos[1]["text"], "Second todo");
}

#[tokio::test]
async fn invalid_todo_bodies_create_nothing() {
    let app = test_app();
    let (_, token) = signup(&app, "user@example.com", "examplePass123").await;

    for body in [json!({ "text": "" }), json!({ "text": "   " }), json!({}), json!({ "text": 5 })] {
        let res = send(&app, Method::POST, "/todos", Some(&token), Some(body.clone())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
    }

    let res = send(&app, Method::GET, "/todos", Some(&token), None).await;
    assert!(res.json()["todos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn users_only_see_their_own_todos() {
    let app = test_app();
    let (_, alice) = signup(&app, "user@domain.com", "testPassword1").await;
    let (_, bob) = signup(&app, "user2@domain.com", "testPassword2").await;

    let todo = create(&app, &alice, "First todo").await;
    create(&app, &bob, "Second todo").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let res = send(&app, Method::GET, "/todos", Some(&alice), None).await;
    let todos = res.json()["todos"].as_array().unwrap().clone();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["text"], "First todo");

    let res = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["todo"], todo);

    let res = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_and_missing_todos_look_identical() {
    let app = test_app();
    let (_, alice) = signup(&app, "user@domain.com", "testPassword1").await;
    let (_, bob) = signup(&app, "user2@domain.com", "testPassword2").await;
    let todo = create(&app, &alice, "First todo").await;

    let foreign = format!("/todos/{}", todo["_id"].as_str().unwrap());
    let missing = format!("/todos/{}", uuid::Uuid::new_v4());
    let malformed = "/todos/123abc".to_string();

    for method in [Method::GET, Method::DELETE] {
        let replies = [
            send(&app, method.clone(), &foreign, Some(&bob), None).await,
            send(&app, method.clone(), &missing, Some(&bob), None).await,
            send(&app, method.clone(), &malformed, Some(&bob), None).await,
        ];
        for res in &replies {
            assert_eq!(res.status, StatusCode::NOT_FOUND, "{method}");
            assert_eq!(res.body, replies[0].body);
        }
    }

    let res = send(&app, Method::PATCH, &foreign, Some(&bob), Some(json!({ "text": "mine now" }))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    // still there, unchanged, for its owner
    let res = send(&app, Method::GET, &foreign, Some(&alice), None).await;
    assert_eq!(res.json()["todo"], todo);
}

#[tokio::test]
async fn patch_toggles_completed_at() {
    let app = test_app();
    let (_, token) = signup(&app, "user@example.com", "examplePass123").await;
    let todo = create(&app, &token, "First todo").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let res = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "text": "Updated", "completed": true })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let done = res.json()["todo"].clone();
    assert_eq!(done["text"], "Updated");
    assert_eq!(done["completed"], true);
    assert!(done["completedAt"].is_i64());

    let res = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({ "completed": true }))).await;
    assert_eq!(res.status, StatusCode::OK);
    let again = res.json()["todo"].clone();
    assert_eq!(again["completed"], true);
    assert_eq!(again["completedAt"], done["completedAt"]);

    let res = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({ "completed": false }))).await;
    assert_eq!(res.status, StatusCode::OK);
    let open = res.json()["todo"].clone();
    assert_eq!(open["completed"], false);
    assert!(open["completedAt"].is_null());
    assert_eq!(open["text"], "Updated");
}

#[tokio::test]
async fn patch_with_blank_text_is_rejected() {
    let app = test_app();
    let (_, token) = signup(&app, "user@example.com", "examplePass123").await;
    let todo = create(&app, &token, "First todo").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let res = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({ "text": " " }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(res.json()["todo"]["text"], "First todo");
}

#[tokio::test]
async fn delete_returns_removed_todo() {
    let app = test_app();
    let (_, token) = signup(&app, "user@example.com", "examplePass123").await;
    let todo = create(&app, &token, "Second todo").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let res = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["todo"], todo);

    let res = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_from_another_deployment_is_rejected() {
    let app = test_app();
    let other = test_app();
    let (_, foreign_token) = signup(&other, "user@example.com", "examplePass123").await;
    signup(&app, "user@example.com", "examplePass123").await;

    // same secret, same email, but never issued by this store
    let res = send(&app, Method::GET, "/users/me", Some(&foreign_token), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
