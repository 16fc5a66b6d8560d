use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use url::Url;

use crate::{
    config::ShopifyConfig,
    error::ApiError,
    state::AppState,
    tokens,
    users::{extractors::AuthUser, validate::Violation},
};

lazy_static! {
    static ref SHOP_RE: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9-]*\.myshopify\.com$").unwrap();
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/integrations/shopify/auth-url", get(authorization_url))
        .route("/integrations/shopify/confirmation", post(confirm_authorization))
}

fn check_shop_domain(shop: &str) -> Result<(), ApiError> {
    if SHOP_RE.is_match(shop) {
        return Ok(());
    }
    Err(ApiError::Validation(vec![Violation {
        field: "shop",
        message: "The shop must be a myshopify.com domain.".into(),
    }]))
}

/// Build the merchant-facing authorization URL with a fresh state nonce. The
/// client carries the nonce through the OAuth round trip.
pub fn build_authorization_url(config: &ShopifyConfig, shop: &str, nonce: &str) -> Url {
    let mut url = Url::parse(&format!("https://{shop}/admin/oauth/authorize"))
        .expect("validated shop domain forms a url");
    url.query_pairs_mut()
        .append_pair("client_id", &config.api_key)
        .append_pair("scope", &config.scopes)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("state", nonce);
    url
}

#[derive(Debug, Deserialize)]
pub struct AuthUrlQuery {
    pub shop: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub shop: String,
    pub code: String,
}

/// Shopify's token endpoint response, passed through to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShopifyAccessToken {
    pub access_token: String,
    pub scope: String,
}

#[instrument(skip_all, fields(user_id = %user.id, shop = %query.shop))]
pub async fn authorization_url(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AuthUrlQuery>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    check_shop_domain(&query.shop)?;

    let nonce = tokens::opaque_token();
    let url = build_authorization_url(&state.config.shopify, &query.shop, &nonce);

    Ok(Json(AuthUrlResponse {
        authorization_url: url.into(),
        state: nonce,
    }))
}

/// Exchange the authorization code for a shop access token. The exchange is
/// synchronous; a failing shop endpoint surfaces as 502.
#[instrument(skip_all, fields(user_id = %user.id, shop = %payload.shop))]
pub async fn confirm_authorization(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ConfirmationRequest>,
) -> Result<Json<ShopifyAccessToken>, ApiError> {
    check_shop_domain(&payload.shop)?;
    if payload.code.trim().is_empty() {
        return Err(ApiError::Validation(vec![Violation {
            field: "code",
            message: "The \"code\" field cannot be blank.".into(),
        }]));
    }

    let shopify = &state.config.shopify;
    let response = state
        .http
        .post(format!("https://{}/admin/oauth/access_token", payload.shop))
        .json(&json!({
            "client_id": shopify.api_key,
            "client_secret": shopify.api_secret,
            "code": payload.code,
        }))
        .send()
        .await
        .map_err(|_| ApiError::Upstream("shopify"))?;

    if !response.status().is_success() {
        return Err(ApiError::Upstream("shopify"));
    }

    let token: ShopifyAccessToken = response
        .json()
        .await
        .map_err(|_| ApiError::Upstream("shopify"))?;

    info!(user_id = %user.id, shop = %payload.shop, "shopify authorization confirmed");
    Ok(Json(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShopifyConfig;

    fn config() -> ShopifyConfig {
        ShopifyConfig {
            api_key: "key123".into(),
            api_secret: "secret456".into(),
            scopes: "read_orders,read_products".into(),
            redirect_uri: "http://localhost:8080/integrations/shopify/confirmation".into(),
        }
    }

    #[test]
    fn shop_domain_validation() {
        assert!(check_shop_domain("example-store.myshopify.com").is_ok());
        assert!(check_shop_domain("evil.com").is_err());
        assert!(check_shop_domain("example.myshopify.com.evil.com").is_err());
        assert!(check_shop_domain("UPPER.myshopify.com").is_err());
    }

    #[test]
    fn authorization_url_carries_app_parameters() {
        let url = build_authorization_url(&config(), "example-store.myshopify.com", "nonce42");
        assert_eq!(url.host_str(), Some("example-store.myshopify.com"));
        assert_eq!(url.path(), "/admin/oauth/authorize");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".into(), "key123".into())));
        assert!(pairs.contains(&("scope".into(), "read_orders,read_products".into())));
        assert!(pairs.contains(&("state".into(), "nonce42".into())));
    }

    #[test]
    fn access_token_response_round_trips() {
        let token: ShopifyAccessToken =
            serde_json::from_str(r#"{"access_token":"shpat_abc","scope":"read_orders"}"#).unwrap();
        assert_eq!(token.access_token, "shpat_abc");
        assert_eq!(token.scope, "read_orders");
    }
}
