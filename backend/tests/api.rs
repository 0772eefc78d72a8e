//! HTTP API tests against a server bound to an ephemeral port.

use std::sync::Arc;

use contactload::api::{router, AppState, OWNER_EMAIL_HEADER, OWNER_ID_HEADER, OWNER_SUPERUSER_HEADER};
use contactload::{ContactStore, ImportOptions, ImportSummary, MemoryStore, UploadPolicy};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base: String,
    client: reqwest::Client,
    store: Arc<MemoryStore>,
}

impl TestServer {
    async fn start() -> Self {
        Self::with_options(ImportOptions::default()).await
    }

    async fn with_options(options: ImportOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn ContactStore> = store.clone();
        let app = router(AppState::new(shared, options));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn upload(&self, owner: &str, file_name: &str, body: &[u8]) -> reqwest::Response {
        let part = Part::bytes(body.to_vec()).file_name(file_name.to_string());
        self.client
            .post(self.url("/api/v1/contacts/import"))
            .header(OWNER_ID_HEADER, owner)
            .header(OWNER_EMAIL_HEADER, format!("{}@example.com", owner))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;

    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "contactload");
}

#[tokio::test]
async fn test_import_returns_summary() {
    let server = TestServer::start().await;
    let csv = "Organisation,Description\nAcme Corp,A company\n,Empty org\n";

    let response = server.upload("alice", "contacts.csv", csv.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let summary: ImportSummary = response.json().await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, vec!["Row 3: Organisation is empty"]);
    assert_eq!(server.store.len(), 1);
}

#[tokio::test]
async fn test_import_missing_column() {
    let server = TestServer::start().await;

    let response = server.upload("alice", "contacts.csv", b"Email,Phone\na@b.c,123\n").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("CSV must have an 'Organisation' column"));
    assert!(server.store.is_empty());
}

#[tokio::test]
async fn test_import_gating() {
    let server = TestServer::with_options(ImportOptions {
        policy: UploadPolicy::with_max_bytes(16),
        ..ImportOptions::default()
    })
    .await;

    let response = server.upload("alice", "contacts.txt", b"Organisation\nAcme\n").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "detail": "File must be a CSV file" }));

    let response = server.upload("alice", "contacts.csv", b"Organisation\nAcme\nGlobex\n").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "detail": "File size must not exceed 1MB" }));
}

#[tokio::test]
async fn test_import_without_file_part() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/v1/contacts/import"))
        .header(OWNER_ID_HEADER, "alice")
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "No file provided");
}

#[tokio::test]
async fn test_requires_identity() {
    let server = TestServer::start().await;

    let response = server.client.get(server.url("/api/v1/contacts")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/v1/contacts"))
        .header(OWNER_ID_HEADER, "alice")
        .json(&json!({ "organisation": "  Acme  ", "description": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["organisation"], "Acme");
    assert_eq!(created["description"], Value::Null);

    let response = server
        .client
        .post(server.url("/api/v1/contacts"))
        .header(OWNER_ID_HEADER, "alice")
        .json(&json!({ "organisation": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    server.upload("bob", "bob.csv", b"Company\nGlobex\nInitech\n").await;

    let page: Value = server
        .client
        .get(server.url("/api/v1/contacts?limit=1"))
        .header(OWNER_ID_HEADER, "bob")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["count"], 2);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    let page: Value = server
        .client
        .get(server.url("/api/v1/contacts?q=acme"))
        .header(OWNER_ID_HEADER, "root")
        .header(OWNER_SUPERUSER_HEADER, "true")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["count"], 1);
    assert_eq!(page["data"][0]["ownerId"], "alice");
}

#[tokio::test]
async fn test_export_download() {
    let server = TestServer::start().await;
    server
        .upload("alice", "contacts.csv", "Organisation,Notes\n\"Acme, Inc.\",\"says \"\"hi\"\"\"\n".as_bytes())
        .await;

    let response = server
        .client
        .get(server.url("/api/v1/contacts/export"))
        .header(OWNER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"contacts.csv\""
    );

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Organisation,Description,Owner Name,Owner Email,Created At"));
    assert!(lines
        .next()
        .unwrap()
        .starts_with("\"Acme, Inc.\",\"says \"\"hi\"\"\",,alice@example.com,"));
}

#[tokio::test]
async fn test_bad_query_gets_detail_body() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/api/v1/contacts?skip=abc"))
        .header(OWNER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("skip"));
}

#[tokio::test]
async fn test_preflight_allows_identity_headers() {
    let server = TestServer::start().await;

    let response = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/v1/contacts"))
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "GET")
        .header(
            "access-control-request-headers",
            "x-owner-id,x-owner-email,x-owner-name,x-owner-superuser",
        )
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let allowed = response.headers()["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_lowercase();
    for name in [OWNER_ID_HEADER, OWNER_EMAIL_HEADER, "x-owner-name", OWNER_SUPERUSER_HEADER] {
        assert!(allowed.contains(name), "{name} missing from {allowed}");
    }
}
