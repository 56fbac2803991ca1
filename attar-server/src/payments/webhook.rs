//! Webhook Reconciler
//!
//! Applies signed, asynchronous gateway events to local payment state.
//! Events are keyed by the gateway's transaction id, not the order id.
//!
//! Status precedence is monotonic: a `completed` payment is never
//! downgraded by a late or replayed failure event, and replays of a
//! success event do not restamp the payment date. Events with no matching
//! order are logged and dropped; the gateway still gets an acknowledgment.

use crate::db::repository::order as order_repo;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::util::now_millis;
use sqlx::SqlitePool;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age of a signed event
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A gateway event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Gateway transaction id (payment intent id)
    pub id: String,
}

/// Verify the `t=...,v1=...` signature header over the raw payload
pub fn verify_signature(secret: &str, header: &str, payload: &[u8]) -> AppResult<()> {
    verify_signature_at(secret, header, payload, now_millis() / 1000)
}

fn verify_signature_at(
    secret: &str,
    header: &str,
    payload: &[u8],
    now_secs: i64,
) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(signature_invalid)?;
    if candidates.is_empty() {
        return Err(signature_invalid());
    }
    if (now_secs - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::with_message(
            ErrorCode::WebhookSignatureInvalid,
            "Webhook timestamp outside tolerance",
        ));
    }

    let mut signed_payload = timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    for candidate in candidates {
        let Ok(decoded) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::internal(format!("webhook secret unusable: {e}")))?;
        mac.update(&signed_payload);
        // Constant-time comparison
        if mac.verify_slice(&decoded).is_ok() {
            return Ok(());
        }
    }
    Err(signature_invalid())
}

fn signature_invalid() -> AppError {
    AppError::new(ErrorCode::WebhookSignatureInvalid)
}

/// Apply a verified event to payment state
pub async fn reconcile(pool: &SqlitePool, event: &WebhookEvent) -> AppResult<()> {
    let transaction_id = &event.data.object.id;
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let rows =
                order_repo::complete_payment_by_transaction(pool, transaction_id, now_millis())
                    .await?;
            if rows == 0 {
                tracing::warn!(
                    %transaction_id,
                    "success event matched no pending order; dropped"
                );
            } else {
                tracing::info!(%transaction_id, "payment completed via webhook");
            }
        }
        "payment_intent.payment_failed" => {
            let rows = order_repo::fail_payment_by_transaction(pool, transaction_id).await?;
            if rows == 0 {
                tracing::warn!(
                    %transaction_id,
                    "failure event matched no pending order; dropped"
                );
            } else {
                tracing::info!(%transaction_id, "payment marked failed via webhook");
            }
        }
        other => {
            tracing::debug!(event_type = other, "unhandled webhook event type");
        }
    }
    Ok(())
}

/// Verify and apply a raw webhook delivery
pub async fn process(
    pool: &SqlitePool,
    webhook_secret: Option<&str>,
    signature_header: Option<&str>,
    payload: &[u8],
) -> AppResult<()> {
    let secret = webhook_secret.ok_or_else(|| {
        AppError::with_message(ErrorCode::ConfigError, "Webhook secret is not configured")
    })?;
    let header = signature_header.ok_or_else(signature_invalid)?;
    verify_signature(secret, header, payload)?;

    let event: WebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::validation(format!("Malformed webhook payload: {e}")))?;
    reconcile(pool, &event).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart;
    use crate::db::testing::{seed_product, test_pool};
    use crate::orders::checkout::{CreateOrderRequest, create_order};
    use shared::models::{
        CartAddItem, LineSource, PaymentMethod, PaymentStatus, ShippingInfo,
    };

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }

    fn now_secs() -> i64 {
        now_millis() / 1000
    }

    fn event_json(event_type: &str, transaction_id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": event_type,
            "data": { "object": { "id": transaction_id } }
        }))
        .unwrap()
    }

    async fn order_with_transaction(pool: &SqlitePool, transaction_id: &str) -> i64 {
        let pid = seed_product(pool, "Amber Noir", 20.0, 10).await;
        cart::add_item(
            pool,
            1,
            &CartAddItem {
                source: LineSource::Product { product_id: pid },
                quantity: 1,
            },
        )
        .await
        .unwrap();
        let order = create_order(
            pool,
            1,
            &CreateOrderRequest {
                shipping_info: ShippingInfo {
                    address: "12 Canal Road".into(),
                    city: "Lahore".into(),
                    state: "Punjab".into(),
                    country: "PK".into(),
                    zip_code: "54000".into(),
                    phone: "+92 300 0000000".into(),
                },
                payment_method: PaymentMethod::CreditCard,
            },
        )
        .await
        .unwrap();
        order_repo::set_payment_pending(pool, order.id, transaction_id)
            .await
            .unwrap();
        order.id
    }

    async fn payment_of(pool: &SqlitePool, order_id: i64) -> (PaymentStatus, Option<i64>) {
        let order = order_repo::find_by_id(pool, order_id)
            .await
            .unwrap()
            .unwrap();
        (order.payment.status, order.payment.payment_date)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = b"{\"type\":\"payment_intent.succeeded\"}";
        let ts = now_secs();
        let header = sign(payload, SECRET, ts);
        assert!(verify_signature(SECRET, &header, payload).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = sign(payload, "whsec_other", now_secs());
        let err = verify_signature(SECRET, &header, payload).unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(b"{\"amount\":1}", SECRET, now_secs());
        let err = verify_signature(SECRET, &header, b"{\"amount\":9}").unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let ts = now_secs() - 600;
        let header = sign(payload, SECRET, ts);
        let err = verify_signature(SECRET, &header, payload).unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
        assert!(err.message.contains("tolerance"));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let err = verify_signature(SECRET, "v1=deadbeef", b"{}").unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
        let err = verify_signature(SECRET, "t=abc", b"{}").unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
    }

    #[tokio::test]
    async fn test_success_event_completes_payment() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_success").await;

        let payload = event_json("payment_intent.succeeded", "pi_success");
        let event: WebhookEvent = serde_json::from_slice(&payload).unwrap();
        reconcile(&pool, &event).await.unwrap();

        let (status, date) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Completed);
        assert!(date.is_some());
    }

    #[tokio::test]
    async fn test_replay_does_not_restamp() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_replay").await;

        let payload = event_json("payment_intent.succeeded", "pi_replay");
        let event: WebhookEvent = serde_json::from_slice(&payload).unwrap();
        reconcile(&pool, &event).await.unwrap();

        sqlx::query("UPDATE orders SET payment_date = 777 WHERE id = ?")
            .bind(order_id)
            .execute(&pool)
            .await
            .unwrap();

        reconcile(&pool, &event).await.unwrap();
        let (status, date) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Completed);
        assert_eq!(date, Some(777));
    }

    #[tokio::test]
    async fn test_failure_event_marks_failed() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_fail").await;

        let payload = event_json("payment_intent.payment_failed", "pi_fail");
        let event: WebhookEvent = serde_json::from_slice(&payload).unwrap();
        reconcile(&pool, &event).await.unwrap();

        let (status, _) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_stale_failure_cannot_downgrade_completed() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_race").await;

        let succeeded = event_json("payment_intent.succeeded", "pi_race");
        let event: WebhookEvent = serde_json::from_slice(&succeeded).unwrap();
        reconcile(&pool, &event).await.unwrap();

        // The failure arrives late, out of order
        let failed = event_json("payment_intent.payment_failed", "pi_race");
        let event: WebhookEvent = serde_json::from_slice(&failed).unwrap();
        reconcile(&pool, &event).await.unwrap();

        let (status, date) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Completed);
        assert!(date.is_some());
    }

    #[tokio::test]
    async fn test_unknown_transaction_dropped_quietly() {
        let pool = test_pool().await;
        let payload = event_json("payment_intent.succeeded", "pi_nobody");
        let event: WebhookEvent = serde_json::from_slice(&payload).unwrap();
        // No error surfaces; the gateway still gets its acknowledgment
        assert!(reconcile(&pool, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_unhandled_event_type_acknowledged() {
        let pool = test_pool().await;
        let payload = event_json("charge.refunded", "ch_123");
        let event: WebhookEvent = serde_json::from_slice(&payload).unwrap();
        assert!(reconcile(&pool, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_process_end_to_end() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_full").await;

        let payload = event_json("payment_intent.succeeded", "pi_full");
        let header = sign(&payload, SECRET, now_secs());
        process(&pool, Some(SECRET), Some(&header), &payload)
            .await
            .unwrap();

        let (status, _) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_process_rejects_bad_signature_without_state_change() {
        let pool = test_pool().await;
        let order_id = order_with_transaction(&pool, "pi_forged").await;

        let payload = event_json("payment_intent.succeeded", "pi_forged");
        let header = sign(&payload, "whsec_wrong", now_secs());
        let err = process(&pool, Some(SECRET), Some(&header), &payload)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);

        let (status, _) = payment_of(&pool, order_id).await;
        assert_eq!(status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_process_requires_configured_secret() {
        let pool = test_pool().await;
        let payload = event_json("payment_intent.succeeded", "pi_x");
        let err = process(&pool, None, Some("t=1,v1=00"), &payload)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
