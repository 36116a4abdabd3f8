//! API Integration Tests
//!
//! Full request/response cycles against the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use merchmarket_api::{create_router, create_test_router, ApiConfig, AppState};
use merchmarket_auth::{AuthConfig, AuthService};
use merchmarket_db::{MemoryStore, Store, StoreTx};
use merchmarket_ledger::LedgerConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "api-integration-secret-at-least-32-bytes";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    store: Arc<MemoryStore>,
}

fn test_app_with(ledger: LedgerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::with_default_catalog());
    let mut auth_config = AuthConfig::with_secret(SECRET);
    auth_config.password.memory_cost = 4096;
    auth_config.password.time_cost = 1;
    let auth = AuthService::new(store.clone(), auth_config).unwrap();
    let state = Arc::new(AppState::new(store.clone(), auth, ledger));

    TestApp {
        router: create_test_router(state.clone()),
        state,
        store,
    }
}

fn test_app() -> TestApp {
    test_app_with(LedgerConfig::default())
}

/// Make a request and get the JSON response
async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

async fn login(router: &Router, username: &str, password: &str) -> String {
    let (status, json) = json_request(
        router,
        "POST",
        "/api/auth",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["token"].as_str().unwrap().to_string()
}

async fn set_balance(store: &MemoryStore, username: &str, balance: i64) {
    let account = store.find_account_by_username(username).await.unwrap().unwrap();
    let mut tx = store.begin().await.unwrap();
    tx.update_account_balance(account.id, balance - account.balance)
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

// =============================================================================
// Authentication
// =============================================================================

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_login_registers_with_starting_balance() {
        let app = test_app();
        let token = login(&app.router, "alice", "pw").await;

        let (status, json) = json_request(&app.router, "GET", "/api/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({
                "coins": 1000,
                "inventory": [],
                "coinHistory": {"received": [], "sent": []}
            })
        );
    }

    #[tokio::test]
    async fn test_token_binds_username() {
        let app = test_app();
        let token = login(&app.router, "alice", "pw").await;

        let claims = app.state.auth.jwt.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let app = test_app();
        login(&app.router, "alice", "pw").await;

        let (status, json) = json_request(
            &app.router,
            "POST",
            "/api/auth",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({"error": "Неверный пароль", "code": "INVALID_CREDENTIALS"}));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let app = test_app();

        for body in [
            json!({"username": "alice"}),
            json!({"username": "", "password": "pw"}),
            json!({"password": "pw"}),
        ] {
            let (status, json) =
                json_request(&app.router, "POST", "/api/auth", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Неверный запрос");
            assert_eq!(json["code"], "INVALID_REQUEST");
        }
        assert_eq!(app.store.account_count().await, 0);
    }
}

// =============================================================================
// Bearer token enforcement
// =============================================================================

mod bearer_tests {
    use super::*;

    async fn info_with_header(router: &Router, header: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri("/api/info");
        if let Some(value) = header {
            request = request.header("Authorization", value);
        }
        let response = router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_header() {
        let app = test_app();
        let (status, json) = info_with_header(&app.router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Требуется заголовок Authorization");
    }

    #[tokio::test]
    async fn test_malformed_header() {
        let app = test_app();
        for header in ["Token abc", "Bearer", "Bearer a b"] {
            let (status, json) = info_with_header(&app.router, Some(header)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"], "Неверный формат заголовка Authorization");
        }
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens() {
        let app = test_app();

        let (status, json) = info_with_header(&app.router, Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Неверный или просроченный токен");

        let stale = app
            .state
            .auth
            .jwt
            .issue_at("alice", Utc::now() - Duration::hours(73))
            .unwrap();
        let (status, json) =
            info_with_header(&app.router, Some(&format!("Bearer {}", stale.token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_token_for_unknown_user() {
        let app = test_app();
        let token = app.state.auth.jwt.issue("ghost").unwrap().token;

        let (status, json) = json_request(&app.router, "GET", "/api/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Не удалось найти пользователя");
    }
}

// =============================================================================
// Transfers
// =============================================================================

mod send_coin_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_coins_updates_both_histories() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;
        let bob = login(&app.router, "bob", "pw").await;

        let (status, json) = json_request(
            &app.router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "bob", "amount": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Монетки успешно отправлены");

        let (_, info) = json_request(&app.router, "GET", "/api/info", Some(&alice), None).await;
        assert_eq!(info["coins"], 970);
        assert_eq!(info["coinHistory"]["sent"], json!([{"toUser": "bob", "amount": 30}]));

        let (_, info) = json_request(&app.router, "GET", "/api/info", Some(&bob), None).await;
        assert_eq!(info["coins"], 1030);
        assert_eq!(
            info["coinHistory"]["received"],
            json!([{"fromUser": "alice", "amount": 30}])
        );
    }

    #[tokio::test]
    async fn test_non_positive_amount() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;
        login(&app.router, "bob", "pw").await;

        for amount in [0, -10] {
            let (status, json) = json_request(
                &app.router,
                "POST",
                "/api/sendCoin",
                Some(&alice),
                Some(json!({"toUser": "bob", "amount": amount})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                json,
                json!({
                    "error": "Сумма перевода должна быть положительной",
                    "code": "VALIDATION_ERROR"
                })
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;

        for body in [
            json!({"amount": 10}),
            json!({"toUser": "bob"}),
            json!({"toUser": "bob", "amount": "ten"}),
            json!({"toUser": "", "amount": 10}),
        ] {
            let (status, json) =
                json_request(&app.router, "POST", "/api/sendCoin", Some(&alice), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["code"], "INVALID_REQUEST");
        }
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;

        let (status, json) = json_request(
            &app.router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "nobody", "amount": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Получатель не найден");

        let (_, info) = json_request(&app.router, "GET", "/api/info", Some(&alice), None).await;
        assert_eq!(info["coins"], 1000);
    }

    #[tokio::test]
    async fn test_insufficient_funds_checked_before_recipient() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;

        let (status, json) = json_request(
            &app.router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "nonexistent", "amount": 1_000_000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Недостаточно средств", "code": "INSUFFICIENT_FUNDS"}));
    }

    #[tokio::test]
    async fn test_unknown_sender() {
        let app = test_app();
        login(&app.router, "bob", "pw").await;
        let token = app.state.auth.jwt.issue("ghost").unwrap().token;

        let (status, json) = json_request(
            &app.router,
            "POST",
            "/api/sendCoin",
            Some(&token),
            Some(json!({"toUser": "bob", "amount": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Ошибка при получении отправителя");
    }

    #[tokio::test]
    async fn test_self_transfer_policy() {
        let app = test_app();
        let alice = login(&app.router, "alice", "pw").await;
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "alice", "amount": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let strict = test_app_with(LedgerConfig {
            reject_self_transfer: true,
        });
        let alice = login(&strict.router, "alice", "pw").await;
        let (status, json) = json_request(
            &strict.router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "alice", "amount": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Нельзя отправить монеты самому себе");
    }
}

// =============================================================================
// Purchases
// =============================================================================

mod buy_tests {
    use super::*;

    #[tokio::test]
    async fn test_buy_twice_builds_inventory() {
        let app = test_app();
        let token = login(&app.router, "u", "pw").await;
        set_balance(&app.store, "u", 100).await;

        for _ in 0..2 {
            let (status, json) =
                json_request(&app.router, "GET", "/api/buy/cup", Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(json["message"].as_str().unwrap().contains("успешно куплен"));
        }

        let (_, info) = json_request(&app.router, "GET", "/api/info", Some(&token), None).await;
        assert_eq!(info["coins"], 60);
        assert_eq!(info["inventory"], json!([{"type": "cup", "quantity": 2}]));
    }

    #[tokio::test]
    async fn test_buy_without_funds() {
        let app = test_app();
        let token = login(&app.router, "u", "pw").await;
        set_balance(&app.store, "u", 10).await;

        let (status, json) =
            json_request(&app.router, "GET", "/api/buy/cup", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Недостаточно средств");
        assert!(app.store.purchases().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let app = test_app();
        let token = login(&app.router, "u", "pw").await;

        let (status, json) =
            json_request(&app.router, "GET", "/api/buy/yacht", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({"error": "Товар не найден", "code": "NOT_FOUND"}));
    }

    #[tokio::test]
    async fn test_buy_requires_token() {
        let app = test_app();
        let (status, _) = json_request(&app.router, "GET", "/api/buy/cup", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// =============================================================================
// Probes and full router
// =============================================================================

mod service_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = test_app();

        let (status, json) = json_request(&app.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");

        let (status, json) = json_request(&app.router, "GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["storage"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_full_router_sets_request_id_and_serves_docs() {
        let app = test_app();
        let router = create_router(app.state.clone(), ApiConfig::default());

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let (status, json) =
            json_request(&router, "GET", "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["info"]["title"], "Merchmarket API");
    }

    #[tokio::test]
    async fn test_full_flow() {
        let app = test_app();
        let router = create_router(app.state.clone(), ApiConfig::default());

        let alice = login(&router, "alice", "pw").await;
        let bob = login(&router, "bob", "pw").await;

        let (status, _) = json_request(
            &router,
            "POST",
            "/api/sendCoin",
            Some(&alice),
            Some(json!({"toUser": "bob", "amount": 200})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            json_request(&router, "GET", "/api/buy/pink-hoody", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, info) = json_request(&router, "GET", "/api/info", Some(&bob), None).await;
        assert_eq!(info["coins"], 1000 + 200 - 500);
        assert_eq!(info["inventory"], json!([{"type": "pink-hoody", "quantity": 1}]));
        assert_eq!(
            info["coinHistory"]["received"],
            json!([{"fromUser": "alice", "amount": 200}])
        );
        assert_eq!(app.store.coins_in_circulation().await, 2000);
    }
}
