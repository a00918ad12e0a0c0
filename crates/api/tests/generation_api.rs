//! Integration tests for the generation, upload, and credit endpoints.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use vidova_core::store::GenerationStore;

use common::{body_json, build_test_app, send};

fn translate_body() -> serde_json::Value {
    json!({
        "kind": "translate",
        "source_video_key": "vt/source.mp4",
        "target_language": "hindi",
    })
}

#[tokio::test]
async fn create_requires_authentication() {
    let t = build_test_app();
    let response = send(
        t.app,
        Method::POST,
        "/api/v1/generations",
        None,
        Some(translate_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_returns_queued_job() {
    let t = build_test_app();
    let owner = uuid::Uuid::new_v4();
    let token = t.token_for(owner);

    let response = send(
        t.app.clone(),
        Method::POST,
        "/api/v1/generations",
        Some(&token),
        Some(translate_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "queued");
    assert_eq!(json["data"]["kind"], "translate");
    assert_eq!(json["data"]["owner_id"], owner.to_string());
    // No client name: derived from timestamp + language.
    assert!(json["data"]["name"]
        .as_str()
        .unwrap()
        .ends_with("(hindi)"));
}

#[tokio::test]
async fn create_rejects_unsupported_language() {
    let t = build_test_app();
    let token = t.token_for(uuid::Uuid::new_v4());

    let response = send(
        t.app,
        Method::POST,
        "/api/v1/generations",
        Some(&token),
        Some(json!({
            "kind": "translate",
            "source_video_key": "vt/source.mp4",
            "target_language": "klingon",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_rejects_avatar_without_script_or_audio() {
    let t = build_test_app();
    let token = t.token_for(uuid::Uuid::new_v4());

    let response = send(
        t.app,
        Method::POST,
        "/api/v1/generations",
        Some(&token),
        Some(json!({
            "kind": "photo_to_video",
            "photo_key": "ptv/portrait.jpg",
            "resolution": "720p",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let t = build_test_app();
    let alice = uuid::Uuid::new_v4();
    let bob = uuid::Uuid::new_v4();
    let token = t.token_for(alice);

    for owner in [alice, alice, bob] {
        send(
            t.app.clone(),
            Method::POST,
            "/api/v1/generations",
            Some(&t.token_for(owner)),
            Some(translate_body()),
        )
        .await;
    }

    let response = send(t.app, Method::GET, "/api/v1/generations", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let jobs = json["data"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert_eq!(job["owner_id"], alice.to_string());
    }
}

#[tokio::test]
async fn get_is_scoped_to_the_owner() {
    let t = build_test_app();
    let alice = uuid::Uuid::new_v4();
    let bob = uuid::Uuid::new_v4();

    let created = send(
        t.app.clone(),
        Method::POST,
        "/api/v1/generations",
        Some(&t.token_for(alice)),
        Some(translate_body()),
    )
    .await;
    let id = body_json(created).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let own = send(
        t.app.clone(),
        Method::GET,
        &format!("/api/v1/generations/{id}"),
        Some(&t.token_for(alice)),
        None,
    )
    .await;
    assert_eq!(own.status(), StatusCode::OK);

    let foreign = send(
        t.app.clone(),
        Method::GET,
        &format!("/api/v1/generations/{id}"),
        Some(&t.token_for(bob)),
        None,
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_updates_the_job_name() {
    let t = build_test_app();
    let owner = uuid::Uuid::new_v4();
    let token = t.token_for(owner);

    let created = send(
        t.app.clone(),
        Method::POST,
        "/api/v1/generations",
        Some(&token),
        Some(translate_body()),
    )
    .await;
    let id = body_json(created).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        t.app.clone(),
        Method::PATCH,
        &format!("/api/v1/generations/{id}/name"),
        Some(&token),
        Some(json!({ "name": "Launch teaser (hindi)" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["name"],
        "Launch teaser (hindi)"
    );

    let blank = send(
        t.app,
        Method::PATCH,
        &format!("/api/v1/generations/{id}/name"),
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn presign_upload_returns_url_and_purpose_scoped_key() {
    let t = build_test_app();
    let token = t.token_for(uuid::Uuid::new_v4());

    let response = send(
        t.app,
        Method::POST,
        "/api/v1/uploads/presign",
        Some(&token),
        Some(json!({
            "file_name": "portrait.jpg",
            "content_type": "image/jpeg",
            "purpose": "ptv_photo",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"]["url"].as_str().unwrap().starts_with("https://"));
    let key = json["data"]["key"].as_str().unwrap();
    assert!(key.starts_with("ptv/"));
    assert!(key.ends_with(".jpg"));
}

#[tokio::test]
async fn credit_balance_reflects_the_store() {
    let t = build_test_app();
    let owner = uuid::Uuid::new_v4();
    t.store.insert_user(owner, 25);
    let token = t.token_for(owner);

    let response = send(t.app, Method::GET, "/api/v1/credits", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["balance"], 25);
}

#[tokio::test]
async fn health_check_is_public() {
    let t = build_test_app();
    let response = send(t.app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn created_jobs_are_visible_in_the_store_queue() {
    let t = build_test_app();
    let owner = uuid::Uuid::new_v4();

    send(
        t.app.clone(),
        Method::POST,
        "/api/v1/generations",
        Some(&t.token_for(owner)),
        Some(translate_body()),
    )
    .await;

    let queued = t.store.queued_jobs(10).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].owner_id, owner);
}
