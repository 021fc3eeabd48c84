//! End-to-end API tests with a mocked torrent backend.
//!
//! These run the full router in-process: precheck, handlers, envelope and
//! response headers.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use rainwatch_core::{JobState, TorrentClientError};

use common::{fixtures, TestConfig, TestFixture, SHARED_KEY};

// =============================================================================
// Service info
// =============================================================================

#[tokio::test]
async fn test_root_returns_bare_info() {
    let fixture = TestFixture::new();
    let response = fixture.get("/").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["app"], "rainwatch");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(response.body["license"], "MIT");
    assert!(response.body.get("status").is_none());
}

#[tokio::test]
async fn test_info_needs_no_auth() {
    let fixture = TestFixture::new();
    let response = fixture.post_with_key("/api/info", json!({}), None).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["app"], "rainwatch");
}

#[tokio::test]
async fn test_server_header_on_every_response() {
    let fixture = TestFixture::new();
    let expected = format!("rainwatch/{}", env!("CARGO_PKG_VERSION"));

    for response in [
        fixture.get("/").await,
        fixture.post("/api/torrent/list", json!({})).await,
        fixture.post_with_key("/api/auth", json!({}), Some("nope")).await,
    ] {
        assert_eq!(response.headers["server"], expected.as_str());
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default().to_string();
    assert!(text.contains("rainwatch_http_requests_total"));
}

// =============================================================================
// Precheck
// =============================================================================

#[tokio::test]
async fn test_auth_accepts_shared_key() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/auth", json!({})).await;

    assert_eq!(response.status.as_u16(), 212);
    assert_eq!(response.body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_auth_rejects_wrong_key() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_key("/api/auth", json!({}), Some("wrong"))
        .await;

    assert_status!(response, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "error");
    assert_eq!(response.body["error"], "auth_fail");
}

#[tokio::test]
async fn test_missing_key_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_key("/api/torrent/list", json!({}), None)
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "www_authenticate_header_missing");
    assert_eq!(fixture.torrent_client.list_calls().await, 0);
}

#[tokio::test]
async fn test_non_json_content_type_is_rejected() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_content_type("/api/torrent/list", "id=1", "application/x-www-form-urlencoded")
        .await;

    assert_status!(response, StatusCode::EXPECTATION_FAILED);
    assert_eq!(response.body["error"], "json_required");
}

#[tokio::test]
async fn test_x_json_content_type_is_accepted() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_content_type("/api/torrent/list", "{}", "text/x-json")
        .await;

    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_no_auth_mode_accepts_missing_key() {
    let fixture = TestFixture::with_config(TestConfig::without_auth());
    let response = fixture
        .post_with_key("/api/auth", json!({}), None)
        .await;

    assert_eq!(response.status.as_u16(), 212);
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new();

    let response = fixture.get_with_key("/api/config", SHARED_KEY).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "shared_key");
    assert_eq!(response.body["auth"]["shared_key_configured"], true);
    assert!(!response.body.to_string().contains(SHARED_KEY));

    let unauthenticated = fixture.get("/api/config").await;
    assert_status!(unauthenticated, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Torrents
// =============================================================================

#[tokio::test]
async fn test_list_is_keyed_by_hash() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("aaa", 100))
        .await;
    fixture
        .torrent_client
        .insert(fixtures::seeding_info("bbb", 300))
        .await;

    let response = fixture.post("/api/torrent/list", json!({})).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    let result = response.body["result"].as_object().unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result["aaa"]["time_added"], 100);
    assert_eq!(result["bbb"]["state"], "seeding");
}

#[tokio::test]
async fn test_list_filters_by_state() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("aaa", 100))
        .await;
    fixture
        .torrent_client
        .insert(fixtures::seeding_info("bbb", 300))
        .await;

    let response = fixture
        .post("/api/torrent/list", json!({"state": "seeding"}))
        .await;

    let result = response.body["result"].as_object().unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["bbb"]);
}

#[tokio::test]
async fn test_empty_list() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/torrent/list", json!({})).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["result"], json!({}));
}

#[tokio::test]
async fn test_list_backend_failure_is_bad_gateway() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .fail_next(TorrentClientError::ConnectionFailed("refused".into()))
        .await;

    let response = fixture.post("/api/torrent/list", json!({})).await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "backend_error");
}

#[tokio::test]
async fn test_list_without_backend_is_unavailable() {
    let fixture = TestFixture::with_config(TestConfig::without_backend());
    let response = fixture.post("/api/torrent/list", json!({})).await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "backend_unavailable");
}

#[tokio::test]
async fn test_getinfo_returns_single_torrent() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("abc123", 100))
        .await;
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("def456", 200))
        .await;

    let response = fixture
        .post("/api/torrent/getinfo", json!({"id": "ABC123"}))
        .await;

    assert_status!(response, StatusCode::OK);
    let result = response.body["result"].as_object().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result["abc123"]["name"], "Torrent abc123");
}

#[tokio::test]
async fn test_getinfo_requires_id() {
    let fixture = TestFixture::new();

    for body in [json!({}), json!({"id": ""})] {
        let response = fixture.post("/api/torrent/getinfo", body).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["status"], "error");
        assert_eq!(response.body["error"], "missing_params");
    }
}

#[tokio::test]
async fn test_getinfo_unknown_torrent() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/torrent/getinfo", json!({"id": "nope"}))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "torrent_not_found");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_content_type("/api/torrent/getinfo", "{\"id\":", "application/json")
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "invalid_json");
}

#[tokio::test]
async fn test_empty_key_counts_as_missing() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_key("/api/torrent/list", json!({}), Some(""))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "www_authenticate_header_missing");
}

#[tokio::test]
async fn test_bad_query_string_is_enveloped() {
    let fixture = TestFixture::new();
    let response = fixture
        .get_with_key("/api/torrent/list?state=bogus", SHARED_KEY)
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], "error");
    assert_eq!(response.body["error"], "invalid_params");
}

#[tokio::test]
async fn test_body_wins_over_bad_query_string() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("abc123", 100))
        .await;

    let response = fixture
        .post("/api/torrent/list?state=bogus", json!({}))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["result"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_getinfo_and_list_share_lowercase_keys() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("ABCDEF", 100))
        .await;

    let list = fixture.post("/api/torrent/list", json!({})).await;
    let info = fixture
        .post("/api/torrent/getinfo", json!({"id": "abcdef"}))
        .await;

    let list_keys: Vec<_> = list.body["result"].as_object().unwrap().keys().collect();
    let info_keys: Vec<_> = info.body["result"].as_object().unwrap().keys().collect();
    assert_eq!(list_keys, vec!["abcdef"]);
    assert_eq!(info_keys, list_keys);
}

// =============================================================================
// Storage moves
// =============================================================================

#[tokio::test]
async fn test_move_returns_moved_torrent() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("abc123", 100))
        .await;

    let response = fixture
        .post(
            "/api/torrent/move",
            json!({"id": "ABC123", "dest": "/srv/complete"}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["result"]["abc123"]["base_path"],
        "/srv/complete"
    );
    assert_eq!(
        fixture.torrent_client.moves().await,
        vec![("abc123".to_string(), "/srv/complete".to_string())]
    );
}

#[tokio::test]
async fn test_move_requires_id_and_dest() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/torrent/move", json!({"dest": "/srv"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].as_str().unwrap().contains("'id'"));

    let response = fixture
        .post("/api/torrent/move", json!({"id": "abc123"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "missing_params");
    assert!(response.body["message"].as_str().unwrap().contains("'dest'"));
}

#[tokio::test]
async fn test_move_unknown_torrent() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/torrent/move", json!({"id": "nope", "dest": "/srv"}))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "torrent_not_found");
}

// =============================================================================
// Completion hook
// =============================================================================

#[tokio::test]
async fn test_chook_queues_job() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::torrent_info("abc123", 100))
        .await;

    let response = fixture
        .post("/api/chook", json!({"thash": "abc123", "opts": false}))
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["message"], "Queued as job 1");
    assert_eq!(response.body["result"]["job"], 1);

    let job = fixture.finished_job(1).await;
    assert_eq!(job.state, JobState::Done);
    assert!(fixture.torrent_client.moves().await.is_empty());
}

#[tokio::test]
async fn test_chook_job_moves_storage() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .insert(fixtures::seeding_info("abc123", 100))
        .await;

    let response = fixture
        .put(
            "/api/chook",
            json!({"thash": "abc123", "opts": {"moveto": "/srv/complete"}}),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);

    assert_eq!(fixture.finished_job(1).await.state, JobState::Done);
    assert_eq!(
        fixture.torrent_client.moves().await,
        vec![("abc123".to_string(), "/srv/complete".to_string())]
    );

    let jobs = fixture.post("/api/jobs", json!({})).await;
    assert_status!(jobs, StatusCode::OK);
    assert_eq!(jobs.body["result"][0]["id"], 1);
    assert_eq!(jobs.body["result"][0]["state"], "done");
    assert_eq!(jobs.body["result"][0]["opts"]["moveto"], "/srv/complete");
}

#[tokio::test]
async fn test_chook_job_for_unknown_torrent_fails() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/chook", json!({"thash": "nope", "opts": false}))
        .await;
    assert_status!(response, StatusCode::CREATED);

    let job = fixture.finished_job(1).await;
    assert!(matches!(job.state, JobState::Failed { .. }));
}

#[tokio::test]
async fn test_chook_validation() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/chook", json!({"opts": false})).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "missing_params");

    let response = fixture
        .post("/api/chook", json!({"thash": "abc", "opts": "/srv"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "invalid_params");

    let response = fixture
        .post_with_key("/api/chook", json!({"thash": "abc"}), Some("wrong"))
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    assert!(fixture.state.transfers().jobs().await.is_empty());
}

#[tokio::test]
async fn test_chook_without_backend_is_unavailable() {
    let fixture = TestFixture::with_config(TestConfig::without_backend());
    let response = fixture.post("/api/chook", json!({"thash": "abc"})).await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert!(fixture.state.transfers().jobs().await.is_empty());
}
