use anyhow::Context;
use axum::{async_trait, extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    config::MailConfig,
    error::ApiError,
    state::AppState,
    users::{extractors::AuthUser, validate},
};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpMailer {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    from_address: String,
}

impl HttpMailer {
    pub fn new(http: reqwest::Client, config: &MailConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            from_address: config.from_address.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&json!({
                "from": self.from_address,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .context("mail gateway request")?;

        if !response.status().is_success() {
            anyhow::bail!("mail gateway returned {}", response.status());
        }
        Ok(())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/mail", post(send_mail))
}

#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn send_mail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SendMailRequest>,
) -> Result<StatusCode, ApiError> {
    let mut violations = Vec::new();
    violations.extend(validate::email_format("to", &payload.to));
    violations.extend(validate::required("subject", &payload.subject));
    violations.extend(validate::required("body", &payload.body));
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    state
        .mailer
        .send(&payload.to, &payload.subject, &payload.body)
        .await
        .map_err(|_| ApiError::Upstream("mail"))?;

    info!(user_id = %user.id, "mail dispatched");
    Ok(StatusCode::NO_CONTENT)
}
