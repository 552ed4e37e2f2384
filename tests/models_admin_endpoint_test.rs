use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use vault_ledger::api::{self, AppState};
use vault_ledger::config::Config;
use vault_ledger::db::init_db;
use vault_ledger::{Identity, LedgerService, ManualClock, Repository, Timestamp};

const TIMELOCK_SECS: u64 = 3_600;

struct TestApp {
    app: axum::Router,
    clock: Arc<ManualClock>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let config = Config {
        port: 0,
        database_path: db_path,
        admin: Identity::new("admin"),
        authorized_agent: Some(Identity::new("agent")),
        minimum_deposit: 1,
        page_size_limit: 100,
        start_paused: false,
        strategy_timelock_secs: TIMELOCK_SECS,
    };

    let clock = Arc::new(ManualClock::new(Timestamp::new(1_700_000_000)));
    let ledger = LedgerService::open(
        Arc::new(Repository::new(pool)),
        clock.clone(),
        config.ledger_settings(),
        config.page_size_limit,
    )
    .await
    .expect("open failed");

    TestApp {
        app: api::create_router(AppState::new(ledger)),
        clock,
        _temp: temp_dir,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-caller-id", caller);
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(v.to_string())
        }
        None => axum::body::Body::empty(),
    };

    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn model(version: &str, score: u32) -> Value {
    json!({
        "version": version,
        "externalFileRef": "0.0.9001",
        "contentHash": format!("0x{}", "ab".repeat(32)),
        "performanceScore": score,
        "description": "gradient boosted allocator",
    })
}

// ---------------------------------------------------------------------------
// Model snapshots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_active_snapshot() {
    let t = setup_test_app().await;
    for (expected, version) in [(1, "v1"), (2, "v2"), (3, "v3")] {
        let (status, body) =
            send(&t.app, "POST", "/v1/models", Some("agent"), Some(model(version, 8_000))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], expected);
    }

    let (_, body) = send(&t.app, "GET", "/v1/models/1", None, None).await;
    assert_eq!(body["found"], true);
    assert_eq!(body["snapshot"]["active"], false);

    send(&t.app, "POST", "/v1/models/1/activate", Some("agent"), None).await;
    send(&t.app, "POST", "/v1/models/3/activate", Some("agent"), None).await;

    let mut active = 0;
    for index in 1..=3 {
        let (_, body) = send(&t.app, "GET", &format!("/v1/models/{}", index), None, None).await;
        if body["snapshot"]["active"] == true {
            active += 1;
            assert_eq!(index, 3);
        }
    }
    assert_eq!(active, 1);

    let (status, body) = send(&t.app, "GET", "/v1/models/active", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["version"], "v3");
    assert_eq!(body["snapshot"]["contentHash"], "ab".repeat(32));
    assert_eq!(body["integrityDigest"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_no_active_model() {
    let t = setup_test_app().await;

    let (status, body) = send(&t.app, "GET", "/v1/models/active", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NO_ACTIVE_MODEL");
}

#[tokio::test]
async fn test_missing_snapshot_is_not_found_flag() {
    let t = setup_test_app().await;

    let (status, body) = send(&t.app, "GET", "/v1/models/42", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], false);

    let (status, body) = send(&t.app, "POST", "/v1/models/42/activate", Some("agent"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_snapshot_validation() {
    let t = setup_test_app().await;

    let (status, body) =
        send(&t.app, "POST", "/v1/models", Some("agent"), Some(model("v1", 10_001))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PERFORMANCE_SCORE");

    let (status, body) =
        send(&t.app, "POST", "/v1/models", Some("agent"), Some(model("  ", 10))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_VERSION");

    let (status, body) =
        send(&t.app, "POST", "/v1/models", Some("admin"), Some(model("v1", 10))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let mut bad_hash = model("v1", 10);
    bad_hash["contentHash"] = json!("0x1234");
    let (status, _) = send(&t.app, "POST", "/v1/models", Some("agent"), Some(bad_hash)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pause_blocks_deposits_but_not_reads_or_decisions() {
    let t = setup_test_app().await;
    send(&t.app, "POST", "/v1/deposits", Some("alice"), Some(json!({"amount": "100"}))).await;

    let (status, _) = send(&t.app, "POST", "/v1/admin/pause", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send(&t.app, "POST", "/v1/deposits", Some("alice"), Some(json!({"amount": "100"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SYSTEM_PAUSED");

    let (status, body) =
        send(&t.app, "POST", "/v1/withdrawals", Some("alice"), Some(json!({"shares": "10"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SYSTEM_PAUSED");

    let (status, _) = send(&t.app, "GET", "/v1/holders/alice", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send(&t.app, "POST", "/v1/models", Some("agent"), Some(model("v1", 10))).await;
    assert_eq!(status, StatusCode::OK);

    send(&t.app, "POST", "/v1/admin/unpause", Some("admin"), None).await;
    let (status, _) =
        send(&t.app, "POST", "/v1/deposits", Some("alice"), Some(json!({"amount": "100"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admin() {
    let t = setup_test_app().await;

    for uri in [
        "/v1/admin/pause",
        "/v1/admin/unpause",
        "/v1/admin/strategy/execute",
        "/v1/admin/strategy/cancel",
    ] {
        let (status, body) = send(&t.app, "POST", uri, Some("agent"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    let (status, _) = send(
        &t.app,
        "POST",
        "/v1/admin/agent",
        Some("mallory"),
        Some(json!({"agent": "mallory"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, ledger) = send(&t.app, "GET", "/v1/ledger", None, None).await;
    assert_eq!(ledger["authorizedAgent"], "agent");
    assert_eq!(ledger["paused"], false);
}

#[tokio::test]
async fn test_agent_rotation() {
    let t = setup_test_app().await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/admin/agent",
        Some("admin"),
        Some(json!({"agent": "agent-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authorizedAgent"], "agent-2");

    let (status, _) =
        send(&t.app, "POST", "/v1/models", Some("agent"), Some(model("v1", 10))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        send(&t.app, "POST", "/v1/models", Some("agent-2"), Some(model("v1", 10))).await;
    assert_eq!(status, StatusCode::OK);

    send(&t.app, "POST", "/v1/admin/agent", Some("admin"), Some(json!({"agent": null}))).await;
    let (status, _) =
        send(&t.app, "POST", "/v1/models", Some("agent-2"), Some(model("v2", 10))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_transfer() {
    let t = setup_test_app().await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/v1/admin/transfer",
        Some("admin"),
        Some(json!({"admin": "admin-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&t.app, "POST", "/v1/admin/pause", Some("admin"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&t.app, "POST", "/v1/admin/pause", Some("admin-2"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_minimum_deposit() {
    let t = setup_test_app().await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/admin/minimum-deposit",
        Some("admin"),
        Some(json!({"amount": "500"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["minimumDeposit"], "500");

    let (status, body) =
        send(&t.app, "POST", "/v1/deposits", Some("alice"), Some(json!({"amount": "499"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AMOUNT");

    let (status, _) =
        send(&t.app, "POST", "/v1/deposits", Some("alice"), Some(json!({"amount": "500"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_strategy_timelock() {
    let t = setup_test_app().await;

    let (status, body) = send(&t.app, "POST", "/v1/admin/strategy/execute", Some("admin"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_PENDING_STRATEGY");

    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/admin/strategy/propose",
        Some("admin"),
        Some(json!({"strategyRef": "morpho-usdc"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending"]["strategyRef"], "morpho-usdc");
    assert_eq!(body["pending"]["eta"], 1_700_000_000u64 + TIMELOCK_SECS);

    t.clock.advance(TIMELOCK_SECS - 1);
    let (status, body) = send(&t.app, "POST", "/v1/admin/strategy/execute", Some("admin"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TIMELOCK_ACTIVE");

    t.clock.advance(1);
    let (status, body) = send(&t.app, "POST", "/v1/admin/strategy/execute", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStrategy"], "morpho-usdc");

    let (_, ledger) = send(&t.app, "GET", "/v1/ledger", None, None).await;
    assert_eq!(ledger["currentStrategy"], "morpho-usdc");
    assert!(ledger.get("pendingStrategy").is_none());
}

#[tokio::test]
async fn test_strategy_cancel_and_empty_ref() {
    let t = setup_test_app().await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/admin/strategy/propose",
        Some("admin"),
        Some(json!({"strategyRef": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STRATEGY");

    send(
        &t.app,
        "POST",
        "/v1/admin/strategy/propose",
        Some("admin"),
        Some(json!({"strategyRef": "aave-usdc"})),
    )
    .await;
    let (status, _) = send(&t.app, "POST", "/v1/admin/strategy/cancel", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(TIMELOCK_SECS);
    let (status, body) = send(&t.app, "POST", "/v1/admin/strategy/execute", Some("admin"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_PENDING_STRATEGY");
}
