use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AccessTokenResponse, ChangePasswordRequest, ConfirmEmailRequest, RegisterRequest,
        RequestPasswordResetRequest, ResetPasswordRequest, TokenRequest, UpdateUserRequest,
        ValidateResetTokenRequest, ValidateResetTokenResponse,
    },
    extractors::AuthUser,
    repo::User,
    service,
    validate,
};
use crate::{error::ApiError, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/auth/token", post(get_token))
        .route("/user/password/reset", post(request_password_reset))
        .route("/user/password/reset/validate", post(validate_reset_token))
        .route("/user/password/reset/:token", patch(reset_password))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(show).patch(update).delete(delete_account))
        .route("/user/password", put(change_password))
        .route(
            "/user/email-confirmation",
            post(send_confirmation_email).patch(confirm_email),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    payload.email = payload.email.trim().to_string();

    let user = service::create_user(&state, &payload).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn get_token(
    State(state): State<AppState>,
    Json(mut payload): Json<TokenRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_string();
    payload.validate()?;

    let access_token = service::get_token(&state, &payload.email, &payload.password)
        .await
        .map_err(|err| {
            if matches!(err, ApiError::Unauthorized) {
                warn!("token request rejected");
            }
            err
        })?;

    Ok(Json(AccessTokenResponse { access_token }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let updated = service::update_profile(&state, &user, &payload).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    service::change_password(&state, &user, &payload.new_password, &payload.old_password).await?;

    info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    service::delete_user(&state, &user).await?;

    info!(user_id = %user.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<RequestPasswordResetRequest>,
) -> Result<StatusCode, ApiError> {
    if let Some(violation) = validate::required("email", &payload.email) {
        return Err(ApiError::Validation(vec![violation]));
    }

    service::request_password_reset(&state, payload.email.trim()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    payload.validate()?;

    let access_token = service::reset_password(&state, &token, &payload.password).await?;

    info!("password reset completed");
    Ok(Json(AccessTokenResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateResetTokenRequest>,
) -> Result<Json<ValidateResetTokenResponse>, ApiError> {
    if let Some(violation) = validate::required("password_reset_token", &payload.password_reset_token)
    {
        return Err(ApiError::Validation(vec![violation]));
    }

    let is_valid = service::is_reset_token_valid(&state, &payload.password_reset_token).await?;

    Ok(Json(ValidateResetTokenResponse { is_valid }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn send_confirmation_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    service::send_confirmation_email(&state, &user).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn confirm_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ConfirmEmailRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    if let Some(violation) =
        validate::required("confirmation_token", &payload.confirmation_token)
    {
        return Err(ApiError::Validation(vec![violation]));
    }

    let access_token =
        service::confirm_email(&state, &payload.confirmation_token, &user).await?;

    info!(user_id = %user.id, "email confirmed");
    Ok(Json(AccessTokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_response_serialization() {
        let json = serde_json::to_string(&ValidateResetTokenResponse { is_valid: true }).unwrap();
        assert_eq!(json, "{\"is_valid\":true}");
    }
}
