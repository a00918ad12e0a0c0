use vidova_core::credits::CreditPacks;
use vidova_inference::ModalCredentials;

use crate::auth::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Fields with defaults are suitable for local development; required
/// fields fail fast at startup when missing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URL of this deployment; the inference callback URL is
    /// derived from it.
    pub public_base_url: String,
    /// Per-user concurrent generation limit (default: `5`).
    pub per_user_concurrency: usize,
    /// S3 bucket holding uploads and generation outputs.
    pub s3_bucket: String,
    /// API key for the asynchronous inference provider.
    pub fal_key: String,
    /// Modal text-to-speech endpoint URL.
    pub modal_tts_url: String,
    /// Modal photo-to-video endpoint URL.
    pub modal_photo_to_video_url: String,
    /// Modal endpoint credentials.
    pub modal_credentials: ModalCredentials,
    /// Shared secret verifying billing webhook signatures.
    pub billing_webhook_secret: String,
    /// Product-id to credit-pack mapping.
    pub credit_packs: CreditPacks,
    /// JWT validation configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default                 |
    /// |----------------------------|----------|-------------------------|
    /// | `HOST`                     | no       | `0.0.0.0`               |
    /// | `PORT`                     | no       | `3000`                  |
    /// | `CORS_ORIGINS`             | no       | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`     | no       | `30`                    |
    /// | `PUBLIC_BASE_URL`          | **yes**  | --                      |
    /// | `PER_USER_CONCURRENCY`     | no       | `5`                     |
    /// | `S3_BUCKET_NAME`           | **yes**  | --                      |
    /// | `FAL_KEY`                  | **yes**  | --                      |
    /// | `MODAL_TTS_URL`            | **yes**  | --                      |
    /// | `MODAL_PHOTO_TO_VIDEO_URL` | **yes**  | --                      |
    /// | `MODAL_KEY`                | **yes**  | --                      |
    /// | `MODAL_SECRET`             | **yes**  | --                      |
    /// | `BILLING_WEBHOOK_SECRET`   | **yes**  | --                      |
    /// | `CREDITS_PRODUCT_SMALL`    | **yes**  | --                      |
    /// | `CREDITS_PRODUCT_MEDIUM`   | **yes**  | --                      |
    /// | `CREDITS_PRODUCT_LARGE`    | **yes**  | --                      |
    ///
    /// # Panics
    ///
    /// Panics when a required variable is missing or a numeric one fails
    /// to parse; misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = require("PUBLIC_BASE_URL")
            .trim_end_matches('/')
            .to_string();

        let per_user_concurrency: usize = std::env::var("PER_USER_CONCURRENCY")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("PER_USER_CONCURRENCY must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            per_user_concurrency,
            s3_bucket: require("S3_BUCKET_NAME"),
            fal_key: require("FAL_KEY"),
            modal_tts_url: require("MODAL_TTS_URL"),
            modal_photo_to_video_url: require("MODAL_PHOTO_TO_VIDEO_URL"),
            modal_credentials: ModalCredentials {
                key: require("MODAL_KEY"),
                secret: require("MODAL_SECRET"),
            },
            billing_webhook_secret: require("BILLING_WEBHOOK_SECRET"),
            credit_packs: CreditPacks {
                small_product_id: require("CREDITS_PRODUCT_SMALL"),
                medium_product_id: require("CREDITS_PRODUCT_MEDIUM"),
                large_product_id: require("CREDITS_PRODUCT_LARGE"),
            },
            jwt: JwtConfig::from_env(),
        }
    }

    /// Callback URL handed to the asynchronous inference provider.
    pub fn inference_callback_url(&self) -> String {
        format!("{}/api/v1/webhooks/inference", self.public_base_url)
    }
}

fn require(name: &str) -> String {
    let value = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"));
    assert!(!value.trim().is_empty(), "{name} must not be empty");
    value
}
