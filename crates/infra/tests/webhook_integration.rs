//! End-to-end webhook receiver coverage over a real HTTP listener.
//!
//! Each test boots the full inbound stack (SQLCipher database with
//! migrations, document store, reconciliation service, axum server bound to
//! an ephemeral port) and drives it with reqwest, exercising the same wire
//! path the provider uses.

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use faxgate_core::{FaxJobRepository, FaxService};
use faxgate_domain::constants::{
    EVENT_FAX_COMPLETED, EVENT_INCOMING_FAX, STATUS_IN_PROGRESS, STATUS_SUCCESS,
};
use faxgate_domain::{FaxConfig, FaxDirection, FaxJob, FaxJobFilter};
use faxgate_infra::database::{DbManager, SqlCipherFaxJobRepository, SqlCipherSettingsRepository};
use faxgate_infra::http::HttpClient;
use faxgate_infra::integrations::sinch::{SinchFax, SinchFaxClient};
use faxgate_infra::storage::LocalFaxFileStore;
use faxgate_infra::webhook::WebhookServer;
use serde_json::json;
use tempfile::TempDir;

const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const PDF_BYTES: &[u8] = b"%PDF-1.7 inbound referral";

struct WebhookHarness {
    #[allow(dead_code)]
    temp_dir: TempDir,
    server: WebhookServer,
    jobs: Arc<SqlCipherFaxJobRepository>,
    storage_root: PathBuf,
}

impl WebhookHarness {
    async fn start(enable_webhooks: bool) -> Self {
        let temp_dir = TempDir::new().expect("temporary directory should be created");
        let db_path = temp_dir.path().join("webhook-integration.db");
        let storage_root = temp_dir.path().join("documents");

        let mut config = FaxConfig::default();
        config.enabled = true;
        config.project_id = "proj-webhook".to_string();
        config.api_key = "key".to_string();
        config.api_secret = "secret".to_string();
        config.enable_webhooks = enable_webhooks;
        config.webhook_bind_addr = "127.0.0.1:0".to_string();
        config.file_storage_path = storage_root.to_string_lossy().into_owned();

        let manager = Arc::new(
            DbManager::new(&db_path, 2, Some(TEST_DB_KEY))
                .expect("database manager should initialise"),
        );
        manager.run_migrations().expect("schema migrations should apply");

        let jobs = Arc::new(SqlCipherFaxJobRepository::new(Arc::clone(manager.pool())));
        let checkpoints = Arc::new(SqlCipherSettingsRepository::new(Arc::clone(manager.pool())));
        let files = Arc::new(LocalFaxFileStore::new(storage_root.clone()));
        let http = HttpClient::new().expect("http client should build");
        // The provider client is never called on the webhook path; deliveries
        // carry their own content.
        let provider = Arc::new(SinchFaxClient::new(&config, http));

        let service = Arc::new(FaxService::new(
            provider,
            Arc::clone(&jobs) as Arc<dyn FaxJobRepository>,
            files,
            checkpoints,
            &config,
        ));

        let server = WebhookServer::start(&config, service)
            .await
            .expect("webhook server should bind an ephemeral port");

        Self { temp_dir, server, jobs, storage_root }
    }

    fn url(&self) -> String {
        format!("http://{}/fax/webhook", self.server.local_addr())
    }
}

fn incoming_fax_body(fax_id: &str) -> serde_json::Value {
    json!({
        "event": EVENT_INCOMING_FAX,
        "eventTime": "2025-03-01T10:00:00Z",
        "fax": {
            "id": fax_id,
            "direction": "INBOUND",
            "from": "+15550001111",
            "to": "+15552223333",
            "status": STATUS_SUCCESS,
            "numberOfPages": 2,
            "hasFile": true
        },
        "file": BASE64.encode(PDF_BYTES),
        "fileType": "PDF"
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn non_post_requests_are_rejected() {
    let harness = WebhookHarness::start(true).await;

    let response = reqwest::get(harness.url()).await.expect("request should complete");
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_content_types_are_rejected() {
    let harness = WebhookHarness::start(true).await;

    let response = reqwest::Client::new()
        .post(harness.url())
        .header("content-type", "text/plain")
        .body("INCOMING_FAX")
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("error body should be json");
    assert_eq!(body["error"], "Unsupported content type");
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_rejected() {
    let harness = WebhookHarness::start(true).await;

    let response = reqwest::Client::new()
        .post(harness.url())
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("error body should be json");
    assert_eq!(body["error"], "Invalid request data");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_events_are_acknowledged() {
    let harness = WebhookHarness::start(true).await;

    let response = reqwest::Client::new()
        .post(harness.url())
        .json(&json!({"event": "FAX_PAUSED"}))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("ack body should be json");
    assert_eq!(body["status"], "success");
}

#[tokio::test(flavor = "multi_thread")]
async fn incoming_fax_delivery_persists_the_row_and_document() {
    let harness = WebhookHarness::start(true).await;

    let response = reqwest::Client::new()
        .post(harness.url())
        .json(&incoming_fax_body("01JWEB1"))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let row = harness
        .jobs
        .find_by_provider_id("01JWEB1")
        .await
        .expect("lookup should succeed")
        .expect("delivery should have inserted a row");
    assert_eq!(row.direction, FaxDirection::Inbound);
    assert_eq!(row.from_number, "+15550001111");
    assert_eq!(row.num_pages, 2);

    let stored_path = row.file_path.expect("attached content should be stored");
    assert!(stored_path.starts_with(&harness.storage_root.to_string_lossy().into_owned()));
    let content = std::fs::read(&stored_path).expect("stored document should be readable");
    assert_eq!(content, PDF_BYTES);
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_deliveries_do_not_duplicate_rows() {
    let harness = WebhookHarness::start(true).await;
    let client = reqwest::Client::new();
    let body = incoming_fax_body("01JWEB2");

    for _ in 0..2 {
        let response =
            client.post(harness.url()).json(&body).send().await.expect("request should complete");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    let rows =
        harness.jobs.list(&FaxJobFilter::default()).await.expect("listing should succeed");
    assert_eq!(rows.len(), 1, "replayed delivery must not insert a second row");
}

#[tokio::test(flavor = "multi_thread")]
async fn completion_events_merge_into_the_existing_row() {
    let harness = WebhookHarness::start(true).await;

    // Seed the outbound row the completion event refers to.
    let sent: SinchFax = serde_json::from_value(json!({
        "id": "01JWEB3",
        "from": "+15550001111",
        "to": "+15552223333",
        "status": STATUS_IN_PROGRESS
    }))
    .expect("seed payload should deserialize");
    let job = FaxJob::from_provider(&sent.into_domain(), FaxDirection::Outbound);
    assert!(harness.jobs.insert_if_absent(&job).await.expect("seed insert should succeed"));

    let response = reqwest::Client::new()
        .post(harness.url())
        .json(&json!({
            "event": EVENT_FAX_COMPLETED,
            "fax": {
                "id": "01JWEB3",
                "status": STATUS_SUCCESS,
                "numberOfPages": 4,
                "completedTime": "2025-03-01T10:05:00Z"
            }
        }))
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let row = harness
        .jobs
        .find_by_provider_id("01JWEB3")
        .await
        .expect("lookup should succeed")
        .expect("seeded row should still exist");
    assert_eq!(row.status, STATUS_SUCCESS);
    assert_eq!(row.num_pages, 4);
    assert!(row.provider_completed_time.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_deliveries_record_the_fax() {
    let harness = WebhookHarness::start(true).await;

    let fax_json = json!({
        "id": "01JWEB4",
        "direction": "INBOUND",
        "from": "+15550001111",
        "to": "+15552223333",
        "status": STATUS_SUCCESS,
        "hasFile": true
    })
    .to_string();

    let form = reqwest::multipart::Form::new()
        .text("event", EVENT_INCOMING_FAX)
        .text("eventTime", "2025-03-01T10:00:00Z")
        .text("fax", fax_json)
        .part(
            "file",
            reqwest::multipart::Part::bytes(PDF_BYTES.to_vec())
                .file_name("incoming.pdf")
                .mime_str("application/pdf")
                .expect("mime type should parse"),
        );

    let response = reqwest::Client::new()
        .post(harness.url())
        .multipart(form)
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let row = harness
        .jobs
        .find_by_provider_id("01JWEB4")
        .await
        .expect("lookup should succeed")
        .expect("multipart delivery should have inserted a row");
    let stored_path = row.file_path.expect("binary part should be stored");
    assert_eq!(
        std::fs::read(stored_path).expect("stored document should be readable"),
        PDF_BYTES
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn disabled_webhooks_return_not_found() {
    let harness = WebhookHarness::start(false).await;

    let response = reqwest::Client::new()
        .post(harness.url())
        .json(&incoming_fax_body("01JWEB5"))
        .send()
        .await
        .expect("request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(response.bytes().await.expect("body should be readable").is_empty());
}
