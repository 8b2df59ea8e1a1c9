use blog_seeder::contract::DocumentStore;
use blog_seeder::credentials::{CredentialError, ServiceAccountKey};
use blog_seeder::firestore::{Endpoints, FirestoreClient, EMULATOR_HOST_ENV, PRODUCTION_BASE_URL};
use blog_seeder::load_config::ProjectId;
use serde_json::{json, Value};
use serial_test::serial;
use std::path::Path;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMIT_PATH: &str = "/v1/projects/seeder-test/databases/(default)/documents:commit";

fn fixture_key() -> ServiceAccountKey {
    ServiceAccountKey::from_file(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service_account.json"),
    )
    .expect("fixture key should load")
}

async fn emulator_client(server: &MockServer) -> FirestoreClient {
    let endpoints = Endpoints {
        base_url: server.uri(),
        emulator: true,
    };
    FirestoreClient::connect(ProjectId::new("seeder-test"), fixture_key(), &endpoints)
        .await
        .expect("emulator client should connect")
}

#[tokio::test]
async fn test_set_merge_commits_update_with_leaf_mask() {
    let mock_server = MockServer::start().await;

    let expected = json!({
        "writes": [{
            "update": {
                "name": "projects/seeder-test/databases/(default)/documents/blogs/post1",
                "fields": {
                    "title": { "stringValue": "A" },
                    "contentBlocks": { "arrayValue": { "values": [
                        { "integerValue": "1" },
                        { "integerValue": "2" },
                    ] } },
                    "readTimeMinutes": { "integerValue": "3" },
                    "author": { "mapValue": { "fields": {
                        "name": { "stringValue": "B" },
                    } } },
                },
            },
            "updateMask": { "fieldPaths": ["title", "contentBlocks", "readTimeMinutes", "author.name"] },
        }]
    });

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("authorization", "Bearer owner"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{ "updateTime": "2024-01-01T00:00:00Z" }],
            "commitTime": "2024-01-01T00:00:00Z",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = emulator_client(&mock_server).await;
    let body = json!({
        "title": "A",
        "contentBlocks": [1, 2],
        "readTimeMinutes": 3,
        "author": { "name": "B" },
    });
    client
        .set_merge("blogs", "post1", &body)
        .await
        .expect("merge write should succeed");
}

#[tokio::test]
async fn test_empty_body_sends_empty_mask() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(body_json(json!({
            "writes": [{
                "update": {
                    "name": "projects/seeder-test/databases/(default)/documents/blogs/empty",
                    "fields": {},
                },
                "updateMask": { "fieldPaths": [] },
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = emulator_client(&mock_server).await;
    client
        .set_merge("blogs", "empty", &json!({}))
        .await
        .expect("empty merge should succeed");
}

#[tokio::test]
async fn test_server_error_becomes_store_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string(r#"{"error": {"code": 403, "status": "PERMISSION_DENIED"}}"#),
        )
        .mount(&mock_server)
        .await;

    let client = emulator_client(&mock_server).await;
    let err = client
        .set_merge("blogs", "post1", &json!({ "title": "A" }))
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("403"), "got: {msg}");
    assert!(msg.contains("PERMISSION_DENIED"), "got: {msg}");
}

#[tokio::test]
async fn test_invalid_documents_are_rejected_before_sending() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = emulator_client(&mock_server).await;
    let cases: [(&str, &str, Value); 4] = [
        ("blogs", "post1", json!(["not", "an", "object"])),
        ("blogs", "post1", json!("string body")),
        ("blogs", "", json!({ "title": "A" })),
        ("blogs", "a/b", json!({ "title": "A" })),
    ];
    for (collection, id, body) in cases {
        assert!(
            client.set_merge(collection, id, &body).await.is_err(),
            "{collection}/{id} with {body} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_connect_authenticates_with_service_account() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token": "ya29.live", "expires_in": 3600}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("authorization", "Bearer ya29.live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut key = fixture_key();
    key.token_uri = format!("{}/token", mock_server.uri());
    let endpoints = Endpoints {
        base_url: mock_server.uri(),
        emulator: false,
    };

    let client = FirestoreClient::connect(ProjectId::new("seeder-test"), key, &endpoints)
        .await
        .expect("client should connect");
    client.set_merge("blogs", "a", &json!({ "title": "A" })).await.unwrap();
    client.set_merge("blogs", "b", &json!({ "title": "B" })).await.unwrap();
}

#[tokio::test]
async fn test_connect_fails_when_credentials_are_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error": "invalid_client"}"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut key = fixture_key();
    key.token_uri = format!("{}/token", mock_server.uri());
    let endpoints = Endpoints {
        base_url: mock_server.uri(),
        emulator: false,
    };

    let err = FirestoreClient::connect(ProjectId::new("seeder-test"), key, &endpoints)
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Rejected { status: 401, .. }), "got {err:?}");
}

#[test]
#[serial]
fn test_endpoints_follow_emulator_env() {
    std::env::set_var(EMULATOR_HOST_ENV, " localhost:8080 ");
    assert_eq!(Endpoints::from_env(), Endpoints::emulator("localhost:8080"));

    std::env::set_var(EMULATOR_HOST_ENV, "   ");
    assert_eq!(Endpoints::from_env().base_url, PRODUCTION_BASE_URL);

    std::env::remove_var(EMULATOR_HOST_ENV);
    let endpoints = Endpoints::from_env();
    assert!(!endpoints.emulator);
    assert_eq!(endpoints.base_url, PRODUCTION_BASE_URL);
}
