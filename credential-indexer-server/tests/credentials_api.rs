use std::sync::Arc;

use actix_web::{
    App,
    http::StatusCode,
    test::{self, TestRequest},
    web,
};
use alloy::primitives::U256;
use credential_indexer_logic::{
    CredentialIndexerSettings, CredentialService, CredentialSynchronizer, MetadataClient,
    test_utils::{
        InMemoryCredentialStore, MockLogSource, SUBJECT, issued_log, revoked_log, test_settings,
    },
};
use credential_indexer_server::{CredentialsState, configure_routes};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const SUBJECT_HEX: &str = "0x2222222222222222222222222222222222222222";

struct TestContext {
    source: Arc<MockLogSource>,
    store: Arc<InMemoryCredentialStore>,
    state: web::Data<CredentialsState>,
}

fn context(settings: CredentialIndexerSettings) -> TestContext {
    let source = Arc::new(MockLogSource::new(1_000));
    let store = Arc::new(InMemoryCredentialStore::new());
    let service = Arc::new(CredentialService::new(source.clone(), settings.clone()).unwrap());
    let metadata = MetadataClient::new(service.gateway().clone(), &settings.metadata).unwrap();
    let state = web::Data::new(CredentialsState {
        synchronizer: CredentialSynchronizer::new(service.clone(), store.clone()),
        service,
        metadata,
    });
    TestContext {
        source,
        store,
        state,
    }
}

macro_rules! init_app {
    ($ctx:expr) => {{
        let state = $ctx.state.clone();
        test::init_service(App::new().configure(move |config| configure_routes(config, state)))
            .await
    }};
}

#[actix_web::test]
async fn health_reports_serving() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(body, json!({ "status": "SERVING" }));
}

#[actix_web::test]
async fn lists_credentials_newest_first() {
    let ctx = context(test_settings());
    ctx.source.push_logs([
        issued_log(U256::from(1), SUBJECT, "bafy-1", 100),
        issued_log(U256::from(2), SUBJECT, "bafy-2", 250),
        revoked_log(U256::from(1), 300),
    ]);
    let app = init_app!(ctx);

    let request = TestRequest::get()
        .uri(&format!("/api/v1/credentials?address={SUBJECT_HEX}&window=1000"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["tokenId"], "2");
    assert_eq!(body[0]["issuedAtBlock"], "250");
    assert_eq!(body[0]["uri"], "ipfs://bafy-2");
    assert_eq!(body[0]["gatewayUrl"], "https://ipfs.io/ipfs/bafy-2");
    assert_eq!(body[0]["revoked"], false);
    assert_eq!(body[1]["tokenId"], "1");
    assert_eq!(body[1]["revoked"], true);
    assert_eq!(body[1]["revokedAtBlock"], "300");
}

#[actix_web::test]
async fn empty_window_returns_empty_list() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let request = TestRequest::get()
        .uri(&format!("/api/v1/credentials?address={SUBJECT_HEX}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn invalid_address_is_rejected() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let request = TestRequest::get()
        .uri("/api/v1/credentials?address=0x1234")
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(ctx.source.log_query_count(), 0);
}

#[actix_web::test]
async fn missing_address_is_a_json_validation_error() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let request = TestRequest::get().uri("/api/v1/credentials").to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].as_str().unwrap().contains("address"));
    assert_eq!(ctx.source.log_query_count(), 0);
}

#[actix_web::test]
async fn negative_window_scans_latest_block_only() {
    let ctx = context(test_settings());
    ctx.source.push_logs([
        issued_log(U256::from(1), SUBJECT, "bafy-1", 999),
        issued_log(U256::from(2), SUBJECT, "bafy-2", 1_000),
    ]);
    let app = init_app!(ctx);

    let request = TestRequest::get()
        .uri(&format!("/api/v1/credentials?address={SUBJECT_HEX}&window=-5"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["tokenId"], "2");
}

#[actix_web::test]
async fn node_failure_is_bad_gateway() {
    let ctx = context(test_settings());
    ctx.source.fail_block_number(true);
    let app = init_app!(ctx);

    let request = TestRequest::get()
        .uri(&format!("/api/v1/credentials?address={SUBJECT_HEX}"))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Node unavailable");
    assert!(body["details"].is_string());
}

#[actix_web::test]
async fn sync_persists_and_reports_counts() {
    let ctx = context(test_settings());
    ctx.source.push_logs([
        issued_log(U256::from(1), SUBJECT, "bafy-1", 100),
        issued_log(U256::from(2), SUBJECT, "bafy-2", 200),
        revoked_log(U256::from(2), 300),
    ]);
    let app = init_app!(ctx);

    let request = TestRequest::post()
        .uri("/api/v1/sync")
        .set_json(json!({ "walletAddress": SUBJECT_HEX }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["credentialsCount"], 2);
    assert_eq!(body["data"]["revokedCount"], 1);
    assert_eq!(body["data"]["failedCount"], 0);
    assert!(body["data"]["syncedAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(ctx.store.snapshot().len(), 2);
}

#[actix_web::test]
async fn sync_without_wallet_is_rejected() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let request = TestRequest::post()
        .uri("/api/v1/sync")
        .set_json(json!({ "walletAddress": "not-an-address" }))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.store.snapshot().is_empty());
}

#[actix_web::test]
async fn malformed_sync_body_is_a_json_validation_error() {
    let ctx = context(test_settings());
    let app = init_app!(ctx);

    let request = TestRequest::post()
        .uri("/api/v1/sync")
        .insert_header(("content-type", "application/json"))
        .set_payload("walletAddress=0x22")
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].is_string());
    assert!(ctx.store.snapshot().is_empty());
}

#[actix_web::test]
async fn metadata_is_proxied_from_gateway() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipfs/bafy-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Solidity Bootcamp",
            "description": "Completed six weeks"
        })))
        .mount(&gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipfs/bafy-missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&gateway)
        .await;

    let settings = CredentialIndexerSettings {
        ipfs_gateway: url::Url::parse(&format!("{}/ipfs/", gateway.uri())).unwrap(),
        ..test_settings()
    };
    let ctx = context(settings);
    let app = init_app!(ctx);

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/v1/metadata?cid=bafy-1")
            .to_request(),
    )
    .await;
    assert_eq!(
        body,
        json!({ "title": "Solidity Bootcamp", "description": "Completed six weeks" })
    );

    let response = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/metadata?cid=bafy-missing")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
