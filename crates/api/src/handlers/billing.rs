//! Billing webhook: credit-pack purchase fulfillment.
//!
//! The billing provider signs each delivery with an HMAC-SHA256 hex
//! digest of the raw body in the `x-billing-signature` header. Order-paid
//! events add the purchased pack's credits to the buyer's balance; other
//! event types and unknown products are acknowledged without effect.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use vidova_core::error::CoreError;
use vidova_core::types::Id;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Signature header set by the billing provider.
pub const SIGNATURE_HEADER: &str = "x-billing-signature";

#[derive(Debug, Deserialize)]
struct BillingEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: BillingOrder,
}

#[derive(Debug, Deserialize)]
struct BillingOrder {
    /// Our user id, carried as the billing customer's external id.
    customer_external_id: Id,
    product_id: String,
}

/// Compute the expected hex signature for a payload.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(provided) = header else {
        return false;
    };
    let expected = sign_payload(secret, body);
    provided.eq_ignore_ascii_case(&expected)
}

/// POST /api/v1/webhooks/billing
pub async fn billing_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verify_signature(&state.config.billing_webhook_secret, &body, signature) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let event: BillingEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid event body: {e}")))?;

    if event.event_type != "order.paid" {
        return Ok(Json(json!({ "message": "Event ignored" })));
    }

    let credits = state
        .config
        .credit_packs
        .credits_for_product(&event.data.product_id);
    if credits == 0 {
        tracing::warn!(
            product_id = %event.data.product_id,
            "Paid order for unknown product",
        );
        return Ok(Json(json!({ "message": "Unknown product" })));
    }

    let balance = state
        .store
        .add_credits(event.data.customer_external_id, credits)
        .await?;
    tracing::info!(
        user_id = %event.data.customer_external_id,
        credits,
        balance,
        "Credit pack fulfilled",
    );
    Ok(Json(json!({ "message": "Credits added" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let body = br#"{"type":"order.paid"}"#;
        let sig = sign_payload("secret", body);
        assert!(verify_signature("secret", body, Some(&sig)));
        assert!(!verify_signature("other", body, Some(&sig)));
        assert!(!verify_signature("secret", b"tampered", Some(&sig)));
        assert!(!verify_signature("secret", body, None));
    }
}
