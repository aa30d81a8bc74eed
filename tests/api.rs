// tests/api.rs
// Borda HTTP: autenticação, status e formato do corpo de erro.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use sales_pipeline::{
    config::{AppState, Config},
    db::MemoryDatabase,
};

struct TestApp {
    router: Router,
    token: String,
}

fn test_app() -> TestApp {
    let config = Config::from_lookup(|key| match key {
        "PIPELINE_STORAGE" => Some("memory".into()),
        "JWT_SECRET" => Some("segredo-de-teste".into()),
        _ => None,
    })
    .unwrap();

    let state = AppState::with_database(Arc::new(MemoryDatabase::new()), &config);
    let token = state.auth_service.create_token(Uuid::new_v4()).unwrap();

    TestApp {
        router: sales_pipeline::app(state),
        token,
    }
}

async fn send(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/leads", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "unauthorized");

    let (status, _) = send(&app, "GET", "/api/leads", Some("nao-e-um-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lead_lifecycle_over_http() {
    let app = test_app();
    let token = app.token.clone();

    let (status, created) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&token),
        Some(json!({ "name": "Acme", "source": "website", "status": "new" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "new");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/leads/{id}"),
        Some(&token),
        Some(json!({ "status": "qualified" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "qualified");

    let (status, activities) = send(&app, "GET", &format!("/api/leads/{id}/activities"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activities.as_array().unwrap().len(), 1);
    assert_eq!(activities[0]["activityType"], "status");

    let (status, _) = send(&app, "DELETE", &format!("/api/leads/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/api/leads/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "notFound");
}

#[tokio::test]
async fn validation_errors_name_the_field_in_the_client_language() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/deals")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "pt-BR")
        .body(Body::from(
            json!({ "title": "ERP", "stage": "closed-won", "value": 100, "expectedCloseDate": "2026-12-15" })
                .to_string(),
        ))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["kind"], "validation");
    assert_eq!(body["error"]["details"]["winReason"], json!(["required"]));
}

#[tokio::test]
async fn illegal_transition_is_a_bad_request() {
    let app = test_app();
    let token = app.token.clone();

    let (_, created) = send(
        &app,
        "POST",
        "/api/proposals",
        Some(&token),
        Some(json!({ "title": "T", "status": "draft", "totalValue": 1000 })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["version"], 1);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/proposals/{id}"),
        Some(&token),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"], json!({ "from": "draft", "to": "accepted" }));
}
