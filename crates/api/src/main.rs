use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidova_api::config::ServerConfig;
use vidova_api::routes;
use vidova_api::state::AppState;
use vidova_cloud::S3Storage;
use vidova_core::store::GenerationStore;
use vidova_db::store::PgStore;
use vidova_engine::{
    AdmissionController, Collaborators, Dispatcher, Pipelines, WebhookReconciler,
};
use vidova_inference::{FalQueueClient, ModalEndpoints};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidova_api=debug,vidova_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vidova_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vidova_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    vidova_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn GenerationStore> = Arc::new(PgStore::new(pool));

    // --- Collaborators ---
    let storage = Arc::new(S3Storage::from_env(config.s3_bucket.clone()).await);
    let modal = Arc::new(ModalEndpoints::new(
        config.modal_tts_url.clone(),
        config.modal_photo_to_video_url.clone(),
        config.modal_credentials.clone(),
    ));
    let queue = Arc::new(FalQueueClient::new(config.fal_key.clone()));
    tracing::info!("Collaborator clients constructed");

    // --- Engine ---
    let pipelines = Arc::new(Pipelines::new(
        Arc::clone(&store),
        Collaborators {
            signer: storage.clone(),
            speech: modal.clone(),
            renderer: modal,
            queue,
        },
        config.inference_callback_url(),
    ));
    let admission = Arc::new(AdmissionController::new(config.per_user_concurrency));
    let dispatcher = Dispatcher::new(Arc::clone(&store), pipelines, admission);
    let jobs_notify = dispatcher.notifier();

    let reconciler = Arc::new(WebhookReconciler::new(
        Arc::clone(&store),
        storage.clone(),
    ));

    let dispatcher_cancel = tokio_util::sync::CancellationToken::new();
    let dispatcher_handle = {
        let cancel = dispatcher_cancel.clone();
        tokio::spawn(async move { dispatcher.run(cancel).await })
    };
    tracing::info!("Job dispatcher started");

    // --- App state ---
    let state = AppState {
        store,
        signer: storage,
        reconciler,
        config: Arc::new(config.clone()),
        jobs_notify,
    };

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
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

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop claiming jobs, then let in-flight pipelines reach completion
    // or their suspension point.
    dispatcher_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(30), dispatcher_handle).await;
    tracing::info!("Job dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
