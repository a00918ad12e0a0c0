//! Shared test harness: full router over the in-memory store with mock
//! storage collaborators, mirroring the middleware stack in `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use vidova_api::auth::{generate_access_token, JwtConfig};
use vidova_api::config::ServerConfig;
use vidova_api::routes;
use vidova_api::state::AppState;
use vidova_core::collab::{
    upload_key, CollabError, PresignedUpload, StorageImporter, StorageSigner, UploadPurpose,
};
use vidova_core::credits::CreditPacks;
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;
use vidova_db::memory::MemoryStore;
use vidova_engine::WebhookReconciler;
use vidova_inference::ModalCredentials;

pub struct MockSigner;

#[async_trait]
impl StorageSigner for MockSigner {
    async fn presign_get(&self, key: &str) -> Result<String, CollabError> {
        Ok(format!("https://signed.test/{key}"))
    }

    async fn presign_upload(
        &self,
        file_name: &str,
        _content_type: &str,
        purpose: UploadPurpose,
    ) -> Result<PresignedUpload, CollabError> {
        Ok(PresignedUpload {
            url: format!("https://upload.test/{file_name}"),
            key: upload_key(purpose, file_name),
        })
    }
}

pub struct MockImporter;

#[async_trait]
impl StorageImporter for MockImporter {
    async fn import_remote(&self, _url: &str) -> Result<String, CollabError> {
        Ok("outputs/imported.mp4".to_string())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        per_user_concurrency: 5,
        s3_bucket: "test-bucket".to_string(),
        fal_key: "test-fal-key".to_string(),
        modal_tts_url: "https://modal.test/tts".to_string(),
        modal_photo_to_video_url: "https://modal.test/ptv".to_string(),
        modal_credentials: ModalCredentials {
            key: "test-modal-key".to_string(),
            secret: "test-modal-secret".to_string(),
        },
        billing_webhook_secret: "billing-test-secret".to_string(),
        credit_packs: CreditPacks {
            small_product_id: "prod-small".to_string(),
            medium_product_id: "prod-medium".to_string(),
            large_product_id: "prod-large".to_string(),
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
}

impl TestApp {
    /// A valid bearer token for `user_id`.
    pub fn token_for(&self, user_id: Id) -> String {
        generate_access_token(user_id, &self.config.jwt).unwrap()
    }
}

/// Build the application with the same middleware stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let reconciler = Arc::new(WebhookReconciler::new(
        store.clone() as Arc<dyn GenerationStore>,
        Arc::new(MockImporter),
    ));

    let state = AppState {
        store: store.clone() as Arc<dyn GenerationStore>,
        signer: Arc::new(MockSigner),
        reconciler,
        config: Arc::new(config.clone()),
        jobs_notify: Arc::new(tokio::sync::Notify::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:3000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp { app, store, config }
}

/// Send a request and return the response.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Send a request with a raw body and extra headers, for webhook
/// endpoints that read the body bytes directly.
#[allow(dead_code)]
pub async fn send_raw(
    app: Router,
    uri: &str,
    headers: &[(&str, String)],
    body: impl Into<axum::body::Bytes>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    let request = builder.body(Body::from(body.into())).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
