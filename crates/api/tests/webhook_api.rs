//! Integration tests for the inference callback endpoint.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use vidova_core::job::{JobInput, JobStatus, NewJob, TranslateInput};
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;

use common::{body_json, build_test_app, send_raw, TestApp};

const WEBHOOK_URI: &str = "/api/v1/webhooks/inference";

/// Seed a job suspended on `correlation_id` with `credits` on its owner's
/// balance, the state a job is in while awaiting a provider callback.
async fn seed_suspended_job(t: &TestApp, correlation_id: &str, credits: i64) -> Id {
    let owner = uuid::Uuid::new_v4();
    t.store.insert_user(owner, credits);

    let input = JobInput::Translate(TranslateInput {
        source_video_key: "vt/source.mp4".to_string(),
        target_language: "hindi".to_string(),
    });
    let new = NewJob::build(owner, None, input, chrono::Utc::now()).unwrap();
    let job = t.store.create_job(new).await.unwrap();
    assert!(t.store.mark_processing(job.id).await.unwrap());
    t.store
        .record_correlation(job.id, correlation_id)
        .await
        .unwrap();
    job.id
}

fn success_body(request_id: &str) -> String {
    json!({
        "request_id": request_id,
        "status": "OK",
        "payload": { "video": { "url": "https://provider.test/out.mp4" } },
    })
    .to_string()
}

#[tokio::test]
async fn unparsable_body_is_rejected() {
    let t = build_test_app();
    let response = send_raw(t.app, WEBHOOK_URI, &[], "not json at all").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid callback body");
}

#[tokio::test]
async fn missing_request_id_is_rejected() {
    let t = build_test_app();
    let body = json!({ "request_id": "", "status": "OK" }).to_string();
    let response = send_raw(t.app, WEBHOOK_URI, &[], body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing request_id");
}

#[tokio::test]
async fn unknown_correlation_is_acknowledged() {
    let t = build_test_app();
    let response = send_raw(t.app, WEBHOOK_URI, &[], success_body("req-nobody")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "No job matches this request_id"
    );
}

#[tokio::test]
async fn success_callback_completes_the_job_and_debits() {
    let t = build_test_app();
    let job_id = seed_suspended_job(&t, "req-100", 3).await;

    let response = send_raw(t.app, WEBHOOK_URI, &[], success_body("req-100")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Job completed");

    let job = t.store.job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.output_key.as_deref(), Some("outputs/imported.mp4"));
    assert_eq!(t.store.credit_balance(job.owner_id).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_delivery_does_not_debit_twice() {
    let t = build_test_app();
    let job_id = seed_suspended_job(&t, "req-200", 3).await;

    let first = send_raw(t.app.clone(), WEBHOOK_URI, &[], success_body("req-200")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send_raw(t.app, WEBHOOK_URI, &[], success_body("req-200")).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["message"], "Job already processed");

    let job = t.store.job(job_id).await.unwrap().unwrap();
    assert_eq!(t.store.credit_balance(job.owner_id).await.unwrap(), 2);
}

#[tokio::test]
async fn failure_callback_records_the_provider_detail() {
    let t = build_test_app();
    let job_id = seed_suspended_job(&t, "req-300", 3).await;

    let body = json!({
        "request_id": "req-300",
        "status": "failed",
        "error": "Face not detected in source photo",
    })
    .to_string();
    let response = send_raw(t.app, WEBHOOK_URI, &[], body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Job marked failed");

    let job = t.store.job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.error_detail.as_deref(),
        Some("Face not detected in source photo")
    );
    // Failures never debit.
    assert_eq!(t.store.credit_balance(job.owner_id).await.unwrap(), 3);
}

#[tokio::test]
async fn progress_notice_does_not_transition() {
    let t = build_test_app();
    let job_id = seed_suspended_job(&t, "req-400", 3).await;

    let body = json!({ "request_id": "req-400", "status": "in_progress" }).to_string();
    let response = send_raw(t.app, WEBHOOK_URI, &[], body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Status acknowledged");

    let job = t.store.job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
}

#[tokio::test]
async fn callback_endpoint_needs_no_authentication() {
    let t = build_test_app();
    // No bearer token on the request; a 200 here proves the route sits
    // outside the authenticated surface.
    let response = send_raw(t.app, WEBHOOK_URI, &[], success_body("req-any")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
