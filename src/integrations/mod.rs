use crate::state::AppState;
use axum::Router;

pub mod mail;
pub mod shopify;
pub mod sms;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(sms::routes())
        .merge(sms::webhook_routes())
        .merge(mail::routes())
        .merge(shopify::routes())
}
