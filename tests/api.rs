use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tower::ServiceExt;

use mentorgraph::api::{create_router, AppState};
use mentorgraph::config::Config;
use mentorgraph::error::AppError;
use mentorgraph::store::{
    Attribute, Entity, EntityQuery, EntityReceipt, EntityStore, MemoryEntityStore, NewEntity, Payload,
};

const WALLET: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";
const PEER: &str = "0x1111111111111111111111111111111111111111";

fn config(extra: &[(&'static str, &'static str)]) -> Config {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("MENTORGRAPH_WALLET", WALLET),
        ("STORE_URL", "memory"),
        ("SPACE_ID", "test-space"),
    ]);
    vars.extend(extra.iter().copied());
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn app() -> (Router, MemoryEntityStore) {
    app_with(&[])
}

fn app_with(extra: &[(&'static str, &'static str)]) -> (Router, MemoryEntityStore) {
    let store = MemoryEntityStore::new();
    let state = AppState::new(Arc::new(store.clone()), config(extra));
    (create_router(state), store)
}

/// Store whose every call fails, as an unreachable ledger node would.
struct UnreachableStore;

#[async_trait]
impl EntityStore for UnreachableStore {
    async fn create_entity(&self, _entity: NewEntity) -> Result<EntityReceipt, AppError> {
        Err(AppError::Store("rpc node unreachable".into()))
    }

    async fn update_entity(&self, _key: &str, _entity: NewEntity) -> Result<EntityReceipt, AppError> {
        Err(AppError::Store("rpc node unreachable".into()))
    }

    async fn query(&self, _query: &EntityQuery) -> Result<Vec<Entity>, AppError> {
        Err(AppError::Store("rpc node unreachable".into()))
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        Err(AppError::Store("rpc node unreachable".into()))
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn entity(key: &str, attributes: &[(&str, &str)], payload: Value) -> Entity {
    Entity {
        key: key.to_string(),
        owner: PEER.to_string(),
        content_type: "application/json".to_string(),
        payload: Some(Payload::Json(payload)),
        attributes: attributes.iter().map(|(k, v)| Attribute::new(*k, *v)).collect(),
        created_at: 1_700_000_000,
        expires_at: i64::MAX,
        tx_hash: format!("tx-{key}"),
    }
}

async fn seed_history(store: &MemoryEntityStore) {
    for (key, status) in [("0xs1", "completed"), ("0xs2", "completed"), ("0xs3", "scheduled")] {
        store
            .insert(entity(
                key,
                &[
                    ("type", "session"),
                    ("mentorWallet", WALLET),
                    ("learnerWallet", PEER),
                    ("skill", "rust"),
                    ("status", status),
                ],
                json!({"duration": 60}),
            ))
            .await;
    }
    store
        .insert(entity(
            "0xf1",
            &[("type", "feedback"), ("fromWallet", PEER), ("toWallet", WALLET)],
            json!({"rating": 4, "npsScore": 9, "text": "clear explanations"}),
        ))
        .await;
    store
        .insert(entity(
            "0xf2",
            &[("type", "feedback"), ("fromWallet", PEER), ("toWallet", WALLET)],
            json!({"rating": "5", "npsScore": 10}),
        ))
        .await;
}

#[tokio::test]
async fn health_and_wallet_report_configuration() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/wallet", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], WALLET);
}

#[tokio::test]
async fn unsupported_methods_return_405() {
    let (app, _) = app();
    let cases = [
        (Method::POST, "/api/wallet"),
        (Method::DELETE, "/api/asks"),
        (Method::PUT, "/api/offers"),
        (Method::PATCH, "/api/profiles"),
        (Method::POST, "/api/profile"),
        (Method::DELETE, "/api/me"),
        (Method::POST, "/api/network"),
    ];

    for (method, uri) in cases {
        let (status, body) = send(&app, method.clone(), uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn ask_requires_skill_and_message() {
    let (app, store) = app();

    for body in [
        json!({}),
        json!({"skill": "rust"}),
        json!({"message": "help"}),
        json!({"skill": "  ", "message": "help"}),
    ] {
        let (status, resp) = send(&app, Method::POST, "/api/asks", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "skill and message are required");
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let (app, _) = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/asks")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posted_ask_is_listed() {
    let (app, _) = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/asks",
        Some(json!({"skill": "rust", "message": "lifetimes confuse me"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = created["key"].as_str().unwrap().to_string();
    assert!(created["txHash"].as_str().unwrap().starts_with("0x"));

    let (status, asks) = send(&app, Method::GET, "/api/asks", None).await;
    assert_eq!(status, StatusCode::OK);
    let asks = asks.as_array().unwrap();
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0]["key"], key.as_str());
    assert_eq!(asks[0]["wallet"], WALLET);
    assert_eq!(asks[0]["skill"], "rust");
    assert_eq!(asks[0]["message"], "lifetimes confuse me");
    assert_eq!(asks[0]["status"], "open");
    assert_eq!(asks[0]["spaceId"], "test-space");
}

#[tokio::test]
async fn offer_requires_availability_window() {
    let (app, _) = app();

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/offers",
        Some(json!({"skill": "rust", "message": "can mentor"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "skill, message, and availabilityWindow are required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/offers",
        Some(json!({"skill": "rust", "message": "can mentor", "availabilityWindow": "evenings"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, offers) = send(&app, Method::GET, "/api/offers", None).await;
    assert_eq!(offers[0]["availabilityWindow"], "evenings");
    assert_eq!(offers[0]["status"], "active");
}

#[tokio::test]
async fn profile_creation_and_listing() {
    let (app, _) = app();

    let (status, resp) = send(&app, Method::POST, "/api/profiles", Some(json!({"skills": "rust"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "displayName is required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/profiles",
        Some(json!({"displayName": "Ada", "skills": "rust, wasm", "timezone": "UTC"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profiles) = send(&app, Method::GET, "/api/profiles", None).await;
    assert_eq!(profiles[0]["displayName"], "Ada");
    assert_eq!(profiles[0]["skillsArray"], json!(["rust", "wasm"]));

    let (status, raw) = send(&app, Method::GET, "/api/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    let entities = raw["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["payload"]["displayName"], "Ada");
}

#[tokio::test]
async fn me_without_profile_returns_null_profile() {
    let (app, _) = app();

    let (status, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["wallet"], WALLET);
    assert!(me["profile"].is_null());
    assert_eq!(me["asks"], json!([]));
    assert_eq!(me["sessions"], json!([]));
}

#[tokio::test]
async fn me_enriches_profile_with_reputation() {
    let (app, store) = app();
    seed_history(&store).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "createProfile", "displayName": "Ada", "skills": "rust"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["ok"], true);

    let (status, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(status, StatusCode::OK);

    let profile = &me["profile"];
    assert_eq!(profile["displayName"], "Ada");
    assert_eq!(profile["sessionsCompleted"], 2);
    assert_eq!(profile["sessionsGiven"], 2);
    assert_eq!(profile["sessionsReceived"], 0);
    assert_eq!(profile["avgRating"], 4.5);
    assert_eq!(profile["npsScore"], 10);
    assert_eq!(profile["reputationScore"], 90);
    assert_eq!(profile["topSkillsUsage"], json!([{"skill": "rust", "count": 2}]));
    assert_eq!(profile["peerTestimonials"][0]["text"], "clear explanations");
    assert!(profile["lastActiveTimestamp"].as_str().unwrap().ends_with('Z'));

    let sessions = me["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 3);
    let scheduled = sessions.iter().find(|s| s["key"] == "0xs3").unwrap();
    assert_eq!(scheduled["videoProvider"], "jitsi");
    assert!(scheduled["videoJoinUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://meet.jit.si/mg-0xs3-"));
    assert_eq!(me["feedback"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn me_actions_validate_and_dispatch() {
    let (app, _) = app();

    let (status, resp) = send(&app, Method::POST, "/api/me", Some(json!({"action": "dance"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "Invalid action");
    assert_eq!(resp["ok"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "updateProfile", "displayName": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "createOffer", "skill": "rust", "message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "skill, message, and availabilityWindow are required");

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "createAsk", "skill": "rust", "message": "hi", "expiresIn": "600"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["ok"], true);

    let (_, asks) = send(&app, Method::GET, "/api/asks", None).await;
    let ask = &asks[0];
    let created = chrono::DateTime::parse_from_rfc3339(ask["createdAt"].as_str().unwrap())
        .unwrap()
        .timestamp();
    let ttl = ask["expiresAt"].as_i64().unwrap() - created;
    assert!((599..=601).contains(&ttl), "ttl was {ttl}");
}

#[tokio::test]
async fn update_profile_rewrites_in_place() {
    let (app, _) = app();

    send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "createProfile", "displayName": "Ada", "skills": "rust"})),
    )
    .await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({
            "action": "updateProfile",
            "displayName": "Ada Lovelace",
            "skills": "rust, math",
            "seniority": "expert",
            "contactLinks": {"github": "https://github.com/ada"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profiles) = send(&app, Method::GET, "/api/profiles", None).await;
    let profiles = profiles.as_array().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["displayName"], "Ada Lovelace");
    assert_eq!(profiles[0]["seniority"], "expert");
    assert_eq!(profiles[0]["contactLinks"]["github"], "https://github.com/ada");
}

#[tokio::test]
async fn network_applies_filters() {
    let (app, store) = app();
    seed_history(&store).await;

    send(
        &app,
        Method::POST,
        "/api/asks",
        Some(json!({"skill": "rust", "message": "borrowck"})),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/offers",
        Some(json!({"skill": "go", "message": "channels", "availabilityWindow": "mornings"})),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/profiles",
        Some(json!({"displayName": "Ada", "skills": "Rust", "seniority": "senior"})),
    )
    .await;

    let (status, all) = send(&app, Method::GET, "/api/network", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["asks"].as_array().unwrap().len(), 1);
    assert_eq!(all["offers"].as_array().unwrap().len(), 1);
    assert_eq!(all["profiles"].as_array().unwrap().len(), 1);
    assert_eq!(all["sessions"].as_array().unwrap().len(), 3);

    let (_, rust) = send(&app, Method::GET, "/api/network?skill=rust&seniority=&spaceId=", None).await;
    assert_eq!(rust["asks"].as_array().unwrap().len(), 1);
    assert!(rust["offers"].as_array().unwrap().is_empty());
    assert_eq!(rust["profiles"].as_array().unwrap().len(), 1);
    assert_eq!(rust["sessions"].as_array().unwrap().len(), 3);

    let (_, juniors) = send(&app, Method::GET, "/api/network?seniority=junior", None).await;
    assert!(juniors["profiles"].as_array().unwrap().is_empty());
    assert_eq!(juniors["asks"].as_array().unwrap().len(), 1);

    // Seeded sessions carry no spaceId attribute, so a space predicate excludes them.
    let (_, space) = send(&app, Method::GET, "/api/network?spaceId=test-space", None).await;
    assert_eq!(space["asks"].as_array().unwrap().len(), 1);
    assert!(space["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn refetching_unchanged_data_is_idempotent() {
    let (app, store) = app();
    seed_history(&store).await;
    send(
        &app,
        Method::POST,
        "/api/offers",
        Some(json!({"skill": "rust", "message": "pairing", "availabilityWindow": "weekends"})),
    )
    .await;

    let (_, first) = send(&app, Method::GET, "/api/network", None).await;
    let (_, second) = send(&app, Method::GET, "/api/network", None).await;
    assert_eq!(first, second);

    let (_, first) = send(&app, Method::GET, "/api/offers", None).await;
    let (_, second) = send(&app, Method::GET, "/api/offers", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn network_rejects_repeated_query_params_as_json() {
    let (app, _) = app();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/network?skill=rust&skill=go")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("skill"));
}

#[tokio::test]
async fn latest_profile_wins_with_small_query_limit() {
    let (app, _) = app_with(&[("QUERY_LIMIT", "1")]);

    for name in ["Old", "New"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/profiles",
            Some(json!({"displayName": name, "skills": "rust"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(me["profile"]["displayName"], "New");
    let latest_key = me["profile"]["key"].clone();

    let (status, updated) = send(
        &app,
        Method::POST,
        "/api/me",
        Some(json!({"action": "updateProfile", "displayName": "Newer"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["key"], latest_key);

    let (_, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(me["profile"]["displayName"], "Newer");
}

#[tokio::test]
async fn store_failures_surface_as_generic_500() {
    let state = AppState::new(Arc::new(UnreachableStore), config(&[]));
    let app = create_router(state);

    for (method, uri, body) in [
        (Method::GET, "/api/asks", None),
        (Method::GET, "/api/me", None),
        (Method::GET, "/api/network", None),
        (
            Method::POST,
            "/api/asks",
            Some(json!({"skill": "rust", "message": "help with lifetimes"})),
        ),
    ] {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, json!({"ok": false, "error": "Internal server error"}));
    }
}
