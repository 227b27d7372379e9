use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sentinel_auth::{issue_token, JwtConfig};
use sentinel_blob::MemoryBlobStore;
use sentinel_core::config::{GatewayConfig, QueueRetryConfig};
use sentinel_core::model::{Role, User};
use sentinel_db::MemoryMetadataStore;
use sentinel_gateway::state::GatewayState;
use sentinel_gateway::GatewayApp;
use sentinel_queue::backend::memory::MemoryBackend;
use sentinel_queue::status::StatusHub;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn jwt_config() -> JwtConfig {
    JwtConfig::new("gateway-test-secret-value", "sentinel-ai", Duration::hours(1))
}

fn token_for(role: Role, supervisor_id: Option<Uuid>) -> (Uuid, String) {
    let cfg = jwt_config();
    let user = User {
        id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
        password_hash: "unused".to_string(),
        role,
        supervisor_id,
        created_at: Utc::now(),
    };
    let token = issue_token(&cfg, &user).unwrap();
    (user.id, token)
}

fn app() -> axum::Router {
    let state = GatewayState::new(
        Arc::new(MemoryMetadataStore::new()),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MemoryBackend::new()),
        Arc::new(StatusHub::new()),
        jwt_config(),
        QueueRetryConfig::default(),
        GatewayConfig::default(),
    );
    GatewayApp::new(state).into_router()
}

fn multipart_body(boundary: &str, case_name: &str, files: &[(&str, &str, &[u8])], media_types: &[&str], languages: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    let push = |body: &mut Vec<u8>, s: &str| body.extend_from_slice(s.as_bytes());

    push(&mut body, &format!("--{boundary}\r\n"));
    push(&mut body, "Content-Disposition: form-data; name=\"case_name\"\r\n\r\n");
    push(&mut body, case_name);
    push(&mut body, "\r\n");

    for (filename, content_type, bytes) in files {
        push(&mut body, &format!("--{boundary}\r\n"));
        push(&mut body, &format!("Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n"));
        push(&mut body, &format!("Content-Type: {content_type}\r\n\r\n"));
        body.extend_from_slice(bytes);
        push(&mut body, "\r\n");
    }
    for media_type in media_types {
        push(&mut body, &format!("--{boundary}\r\n"));
        push(&mut body, "Content-Disposition: form-data; name=\"media_types\"\r\n\r\n");
        push(&mut body, media_type);
        push(&mut body, "\r\n");
    }
    for language in languages {
        push(&mut body, &format!("--{boundary}\r\n"));
        push(&mut body, "Content-Disposition: form-data; name=\"languages\"\r\n\r\n");
        push(&mut body, language);
        push(&mut body, "\r\n");
    }

    push(&mut body, &format!("--{boundary}--\r\n"));
    body
}

/// Job ids are hierarchical (`<supervisor>/<owner>/<uuid>`); callers must
/// percent-encode the embedded slashes to address one as a single path
/// segment, same as any REST client would.
fn path_encode_job_id(job_id: &str) -> String {
    job_id.replace('/', "%2F")
}

async fn json_of(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_then_list_jobs_round_trips() {
    let app = app();
    let (_, token) = token_for(Role::Admin, None);
    let boundary = "X-BOUNDARY-1";
    let body = multipart_body(boundary, "C1", &[("report.pdf", "application/pdf", b"hello world")], &["document"], &[""]);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_of(res).await;
    assert_eq!(body["total_files"], 1);
    assert_eq!(body["suspects_count"], 0);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/jobs")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let jobs = json_of(res).await;
    let jobs = jobs.as_array().unwrap();
    assert!(jobs.iter().any(|j| j["id"] == job_id));
}

#[tokio::test]
async fn audio_without_language_is_rejected_synchronously() {
    let app = app();
    let (_, token) = token_for(Role::Analyst, None);
    let boundary = "X-BOUNDARY-2";
    let body = multipart_body(boundary, "C1", &[("call.mp3", "audio/mpeg", b"fake-audio")], &["audio"], &[""]);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_of(res).await;
    assert_eq!(body["className"], "validation");
}

#[tokio::test]
async fn missing_bearer_token_is_rejected() {
    let app = app();
    let res = app.oneshot(Request::builder().uri("/jobs").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn analyst_cannot_view_another_analysts_job() {
    let app = app();
    let (_, owner_token) = token_for(Role::Analyst, None);
    let (_, other_token) = token_for(Role::Analyst, None);

    let boundary = "X-BOUNDARY-3";
    let body = multipart_body(boundary, "C2", &[("notes.txt", "text/plain", b"evidence")], &["document"], &[""]);
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("authorization", format!("Bearer {owner_token}"))
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let job_id = json_of(res).await["job_id"].as_str().unwrap().to_string();

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{}", path_encode_job_id(&job_id)))
                .header("authorization", format!("Bearer {other_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_dlq_endpoints_require_admin_role() {
    let app = app();
    let (_, analyst_token) = token_for(Role::Analyst, None);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/admin/dlq/document")
                .header("authorization", format!("Bearer {analyst_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
