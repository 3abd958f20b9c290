use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tandem_api::config::{AppConfig, StoreBackend};
use tandem_api::store::memory::MemoryStore;
use tandem_api::{build_router, AppState};

fn app() -> Router {
    let config = AppConfig {
        store_backend: StoreBackend::Memory,
        enable_dev_routes: true,
        jwt_secret: "integration-secret".into(),
        ..AppConfig::default()
    };
    build_router(Arc::new(AppState::new(Arc::new(MemoryStore::new()), config)))
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

struct Member {
    id: String,
    token: String,
}

async fn join(app: &Router, email: &str, nickname: &str, gender: &str, interested_in: &[&str]) -> Member {
    let (status, body) = call(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "passw0rd" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    let id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        app,
        "POST",
        "/profile",
        Some(&token),
        Some(json!({
            "nickname": nickname,
            "birthdate": "1995-05-05",
            "gender": gender,
            "interestedIn": interested_in,
            "photoUrls": [format!("https://cdn.example.com/{nickname}.jpg")],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    Member { id, token }
}

fn error_code(body: &Value) -> &str {
    assert_eq!(body["success"], false);
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn swipe_match_and_chat() {
    let app = app();
    let alice = join(&app, "alice@example.com", "Alice", "female", &["male"]).await;
    let bob = join(&app, "bob@example.com", "Bob", "male", &["female"]).await;
    let carol = join(&app, "carol@example.com", "Carol", "female", &["male"]).await;

    // Alice sees Bob but not Carol (Carol is not interested in women).
    let (status, body) = call(&app, "GET", "/candidates?limit=10", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["userId"].as_str())
        .collect();
    assert_eq!(ids, vec![bob.id.as_str()]);

    let like = |target: &str| json!({ "targetUserId": target, "action": "like" });

    let (status, body) = call(&app, "POST", "/decisions", Some(&alice.token), Some(like(bob.id.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["matched"], false);

    let (_, body) = call(&app, "POST", "/decisions", Some(&bob.token), Some(like(alice.id.as_str()))).await;
    assert_eq!(body["data"]["matched"], true);
    assert_eq!(body["data"]["newMatch"], true);
    assert_eq!(body["data"]["partner"]["nickname"], "Alice");
    let match_id = body["data"]["matchId"].as_str().unwrap().to_string();

    // Liking again returns the same match.
    let (_, body) = call(&app, "POST", "/decisions", Some(&bob.token), Some(like(alice.id.as_str()))).await;
    assert_eq!(body["data"]["matchId"], match_id.as_str());
    assert_eq!(body["data"]["newMatch"], false);

    // Alice's deck is empty now that she decided on Bob.
    let (_, body) = call(&app, "GET", "/candidates", Some(&alice.token), None).await;
    assert!(body["data"]["candidates"].as_array().unwrap().is_empty());

    let thread = format!("/messages/{match_id}");
    let (status, body) = call(&app, "POST", &thread, Some(&alice.token), Some(json!({ "content": "  Hi Bob  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"]["content"], "Hi Bob");

    let (_, body) = call(&app, "GET", &format!("/matches/{match_id}"), Some(&bob.token), None).await;
    assert_eq!(body["data"]["match"]["unreadCount"], 1);
    assert_eq!(body["data"]["match"]["partner"]["userId"], alice.id.as_str());

    // Bob opens the thread, which marks Alice's message read.
    let (_, body) = call(&app, "GET", &thread, Some(&bob.token), None).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["isMine"], false);

    let (_, body) = call(&app, "GET", &thread, Some(&alice.token), None).await;
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages[0]["isMine"], true);
    assert!(messages[0]["readAt"].is_string());

    let (_, body) = call(&app, "POST", &format!("{thread}/read"), Some(&bob.token), None).await;
    assert_eq!(body["data"]["updated"], 0);

    let (_, body) = call(&app, "GET", "/matches", Some(&alice.token), None).await;
    let matches = body["data"]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["partner"]["nickname"], "Bob");

    // Matched users can open each other's full profile.
    let (status, _) = call(&app, "GET", &format!("/profile/partner/{}", bob.id), Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Carol is outside the match.
    let (status, body) = call(&app, "POST", &thread, Some(&carol.token), Some(json!({ "content": "hey" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, _) = call(&app, "GET", &thread, Some(&carol.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "GET", &format!("{thread}/live"), Some(&carol.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "GET", &format!("/profile/partner/{}", bob.id), Some(&carol.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn live_stream_is_served_to_participants() {
    let app = app();
    let alice = join(&app, "alice@example.com", "Alice", "female", &["male"]).await;
    let bob = join(&app, "bob@example.com", "Bob", "male", &["female"]).await;

    call(&app, "POST", "/decisions", Some(&alice.token), Some(json!({ "targetUserId": bob.id, "action": "like" }))).await;
    let (_, body) = call(&app, "POST", "/decisions", Some(&bob.token), Some(json!({ "targetUserId": alice.id, "action": "like" }))).await;
    let match_id = body["data"]["matchId"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri(format!("/messages/{match_id}/live"))
        .header(header::AUTHORIZATION, format!("Bearer {}", alice.token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn error_envelope() {
    let app = app();

    let (status, body) = call(&app, "GET", "/matches", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, body) = call(&app, "POST", "/auth/register", None, Some(json!({ "email": "not-an-email", "password": "passw0rd" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, body) = call(&app, "POST", "/auth/register", None, Some(json!({ "email": "dup@example.com", "password": "passw0rd" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "POST", "/auth/register", None, Some(json!({ "email": "DUP@example.com", "password": "passw0rd" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    let (status, body) = call(&app, "POST", "/auth/login", None, Some(json!({ "email": "dup@example.com", "password": "wrong-pass1" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, body) = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "dup@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let (status, body) = call(&app, "POST", "/decisions", Some(&token), Some(json!({ "targetUserId": "nope", "action": "like" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, body) = call(&app, "GET", "/matches/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let missing = uuid::Uuid::now_v7();
    let (status, body) = call(&app, "GET", &format!("/matches/{missing}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn profile_photos_over_http() {
    let app = app();
    let dana = join(&app, "dana@example.com", "Dana", "other", &["all"]).await;

    let add = |url: &str| json!({ "url": url });
    let (status, _) = call(&app, "POST", "/profile/photos", Some(&dana.token), Some(add("https://cdn.example.com/2.jpg"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "POST", "/profile/photos", Some(&dana.token), Some(add("https://cdn.example.com/3.jpg"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["photoUrls"].as_array().unwrap().len(), 3);

    let (status, body) = call(&app, "POST", "/profile/photos", Some(&dana.token), Some(add("https://cdn.example.com/4.jpg"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, _) = call(&app, "DELETE", "/profile/photos/3", Some(&dana.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "DELETE", "/profile/photos/0", Some(&dana.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["photoUrls"][0], "https://cdn.example.com/2.jpg");

    let (status, body) = call(&app, "PATCH", "/profile", Some(&dana.token), Some(json!({ "bio": "Night owl." }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["bio"], "Night owl.");

    let (status, body) = call(&app, "PATCH", "/profile", Some(&dana.token), Some(json!({ "birthdate": "2020-01-01" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn dev_seed_and_clear() {
    let app = app();

    let (status, body) = call(&app, "POST", "/dev/seed-users", None, Some(json!({ "count": 2 }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["created"], 4);

    let (_, body) = call(&app, "POST", "/dev/seed-users", None, Some(json!({ "count": 2 }))).await;
    assert_eq!(body["data"]["created"], 0);
    assert_eq!(body["data"]["skipped"], 4);

    let (status, body) = call(&app, "POST", "/auth/login", None, Some(json!({ "email": "female1@test.com", "password": "test1234" }))).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (_, body) = call(&app, "GET", "/candidates", Some(&token), None).await;
    assert_eq!(body["data"]["candidates"].as_array().unwrap().len(), 2);

    let (_, body) = call(&app, "POST", "/dev/clear-test-users", None, None).await;
    assert_eq!(body["data"]["deleted"], 4);

    let (status, _) = call(&app, "POST", "/auth/login", None, Some(json!({ "email": "female1@test.com", "password": "test1234" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_store() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tandem-api");
    assert_eq!(body["checks"][0]["name"], "store");
}

#[tokio::test]
async fn surrounding_whitespace_is_trimmed_before_validation() {
    let app = app();

    let (status, body) = call(&app, "POST", "/auth/register", None, Some(json!({ "email": " Erin@Example.com ", "password": "passw0rd" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["user"]["email"], "erin@example.com");

    let (status, body) = call(&app, "POST", "/auth/login", None, Some(json!({ "email": "  erin@example.com", "password": "passw0rd" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let profile = |nickname: &str| {
        json!({
            "nickname": nickname,
            "birthdate": "1990-01-01",
            "gender": "female",
            "interestedIn": ["all"],
            "photoUrls": ["https://cdn.example.com/erin.jpg"],
        })
    };
    let (status, body) = call(&app, "POST", "/profile", Some(&token), Some(profile("  J  "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, body) = call(&app, "POST", "/profile", Some(&token), Some(profile("  Jo  "))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["profile"]["nickname"], "Jo");

    let (status, body) = call(&app, "POST", "/profile/photos", Some(&token), Some(json!({ "url": " https://cdn.example.com/2.jpg " }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["profile"]["photoUrls"][1], "https://cdn.example.com/2.jpg");
}
