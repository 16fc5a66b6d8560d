use anyhow::Context;
use axum::{async_trait, extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    config::SmsConfig,
    error::ApiError,
    state::AppState,
    users::{extractors::AuthUser, validate},
};

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, message: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpSmsGateway {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    sender: String,
}

impl HttpSmsGateway {
    pub fn new(http: reqwest::Client, config: &SmsConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            sender: config.sender.clone(),
        }
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, to: &str, message: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&json!({ "from": self.sender, "to": to, "text": message }))
            .send()
            .await
            .context("sms gateway request")?;

        if !response.status().is_success() {
            anyhow::bail!("sms gateway returned {}", response.status());
        }
        Ok(())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/sms", post(send_sms))
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/dlr", post(delivery_event))
}

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    pub to: String,
    pub message: String,
}

/// Delivery receipt pushed by the SMS provider. Providers differ in what
/// they send, so everything past the status is optional.
#[derive(Debug, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub status: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub error_code: Option<i32>,
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn send_sms(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SendSmsRequest>,
) -> Result<StatusCode, ApiError> {
    let mut violations = Vec::new();
    violations.extend(validate::mobile_phone("to", &payload.to));
    violations.extend(validate::required("message", &payload.message));
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    state
        .sms
        .send(&payload.to, &payload.message)
        .await
        .map_err(|_| ApiError::Upstream("sms"))?;

    info!(user_id = %user.id, "sms dispatched");
    Ok(StatusCode::NO_CONTENT)
}

/// Provider webhook. Receipts are recorded in the log only; failures here
/// have no bearing on account state.
#[instrument(skip(payload))]
pub async fn delivery_event(
    Json(payload): Json<DeliveryReceipt>,
) -> Result<StatusCode, ApiError> {
    if let Some(violation) = validate::required("message_id", &payload.message_id) {
        return Err(ApiError::Validation(vec![violation]));
    }

    info!(
        message_id = %payload.message_id,
        status = %payload.status,
        error_code = ?payload.error_code,
        "sms delivery receipt"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_receipt_accepts_minimal_payload() {
        let receipt: DeliveryReceipt =
            serde_json::from_str(r#"{"message_id":"abc123","status":"delivered"}"#).unwrap();
        assert_eq!(receipt.message_id, "abc123");
        assert_eq!(receipt.status, "delivered");
        assert!(receipt.to.is_none());
        assert!(receipt.error_code.is_none());
    }

    #[test]
    fn delivery_receipt_accepts_provider_extras() {
        let receipt: DeliveryReceipt = serde_json::from_str(
            r#"{"message_id":"abc123","status":"failed","to":"+37069037984","error_code":34}"#,
        )
        .unwrap();
        assert_eq!(receipt.error_code, Some(34));
    }
}
