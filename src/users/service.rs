use tracing::{debug, warn};

use super::dto::{RegisterRequest, UpdateUserRequest};
use super::password;
use super::repo::{NewUser, ProfileChanges, User};
use super::validate;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tokens::{self, repo as token_repo, TokenKind};

const EMAIL_TAKEN: &str = "Email already registered.";

fn email_taken_violation() -> ApiError {
    ApiError::Validation(vec![validate::Violation {
        field: "email",
        message: "The email has already been taken.".into(),
    }])
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

pub async fn create_user(state: &AppState, request: &RegisterRequest) -> Result<User, ApiError> {
    request.validate()?;

    if User::email_taken(&state.db, &request.email).await? {
        return Err(ApiError::Conflict(EMAIL_TAKEN));
    }

    let password_hash = password::hash_password(&request.password)?;
    let access_token = tokens::opaque_token();

    let new_user = NewUser {
        first_name: request.first_name.trim(),
        last_name: request.last_name.trim(),
        email: request.email.trim(),
        mobile_phone: request.mobile_phone.trim(),
        company: request.company.trim(),
        password_hash: &password_hash,
        access_token: &access_token,
    };

    match User::create(&state.db, &new_user).await {
        Ok(user) => Ok(user),
        // concurrent registration of the same email loses against the
        // partial unique index
        Err(err) if is_unique_violation(&err) => Err(ApiError::Conflict(EMAIL_TAKEN)),
        Err(err) => Err(err.into()),
    }
}

/// Exchange credentials for the stored bearer token. Unknown email and wrong
/// password are indistinguishable to the caller; the missing-user path burns
/// a dummy verification so it costs the same.
pub async fn get_token(state: &AppState, email: &str, pass: &str) -> Result<String, ApiError> {
    let Some(user) = User::find_by_email(&state.db, email).await? else {
        password::verify_dummy();
        return Err(ApiError::Unauthorized);
    };

    if !password::verify_password(pass, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }

    Ok(user.access_token)
}

pub async fn change_password(
    state: &AppState,
    user: &User,
    new_password: &str,
    old_password: &str,
) -> Result<(), ApiError> {
    if !password::verify_password(old_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }

    let password_hash = password::hash_password(new_password)?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;
    Ok(())
}

/// Always succeeds from the caller's perspective: the 204 does not reveal
/// whether the address belongs to an account.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), ApiError> {
    let Some(user) = User::find_by_email(&state.db, email).await? else {
        debug!("password reset requested for unknown email");
        return Ok(());
    };

    let token = token_repo::issue(&state.db, user.id, TokenKind::PasswordReset).await?;

    let mailer = state.mailer.clone();
    let reset_url = format!(
        "{}/user/password/reset/{}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );
    let to = user.email.clone();
    tokio::spawn(async move {
        let body = format!(
            "A password reset was requested for your account.\n\
             Follow this link to choose a new password: {reset_url}\n\
             If this was not you, ignore this message."
        );
        if let Err(error) = mailer.send(&to, "Reset your password", &body).await {
            warn!(error = %error, "password reset mail dispatch failed");
        }
    });

    Ok(())
}

/// Consume a reset token and store the new password in one transaction, then
/// hand back the owner's access token so the client continues authenticated.
pub async fn reset_password(
    state: &AppState,
    token_value: &str,
    new_password: &str,
) -> Result<String, ApiError> {
    let ttl = state.config.security.reset_token_ttl();
    let token = token_repo::find_valid(&state.db, token_value, TokenKind::PasswordReset, ttl)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    let user = User::find_by_id(&state.db, token.user_id)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    if let Some(violation) = validate::password_not_email("password", new_password, &user.email) {
        return Err(ApiError::Validation(vec![violation]));
    }

    let password_hash = password::hash_password(new_password)?;

    let mut tx = state.db.begin().await?;
    // the claim and the password write commit together; a concurrent spend of
    // the same token deletes nothing and fails here
    if !token_repo::consume(&mut *tx, token.id).await? {
        return Err(ApiError::InvalidToken);
    }
    User::set_password_hash(&mut *tx, user.id, &password_hash).await?;
    tx.commit().await?;

    Ok(user.access_token)
}

pub async fn send_confirmation_email(state: &AppState, user: &User) -> Result<(), ApiError> {
    let token = token_repo::issue(&state.db, user.id, TokenKind::EmailConfirmation).await?;

    let mailer = state.mailer.clone();
    let to = user.email.clone();
    tokio::spawn(async move {
        let body = format!(
            "Confirm your email address by submitting this token: {token}"
        );
        if let Err(error) = mailer.send(&to, "Confirm your email", &body).await {
            warn!(error = %error, "confirmation mail dispatch failed");
        }
    });

    Ok(())
}

/// The token must belong to the calling user; a foreign token fails exactly
/// like a missing one and confirms nothing.
pub async fn confirm_email(
    state: &AppState,
    confirmation_token: &str,
    user: &User,
) -> Result<String, ApiError> {
    let ttl = state.config.security.confirmation_token_ttl();

    let mut tx = state.db.begin().await?;
    let consumed = token_repo::consume_for_user(
        &mut *tx,
        confirmation_token,
        TokenKind::EmailConfirmation,
        user.id,
        ttl,
    )
    .await?;
    if !consumed {
        return Err(ApiError::InvalidToken);
    }
    User::mark_email_confirmed(&mut *tx, user.id).await?;
    tx.commit().await?;

    Ok(user.access_token.clone())
}

pub async fn is_reset_token_valid(state: &AppState, token_value: &str) -> Result<bool, ApiError> {
    let ttl = state.config.security.reset_token_ttl();
    let token =
        token_repo::find_valid(&state.db, token_value, TokenKind::PasswordReset, ttl).await?;
    Ok(token.is_some())
}

pub async fn update_profile(
    state: &AppState,
    user: &User,
    request: &UpdateUserRequest,
) -> Result<User, ApiError> {
    request.validate()?;

    // on update the unique rule reports like any other field violation
    if let Some(email) = request.email.as_deref() {
        if User::email_taken_by_other(&state.db, email, user.id).await? {
            return Err(email_taken_violation());
        }
    }

    let changes = ProfileChanges {
        first_name: request.first_name.as_deref().map(str::trim),
        last_name: request.last_name.as_deref().map(str::trim),
        email: request.email.as_deref().map(str::trim),
        mobile_phone: request.mobile_phone.as_deref().map(str::trim),
        company: request.company.as_deref().map(str::trim),
    };

    match User::update_profile(&state.db, user.id, &changes).await {
        Ok(Some(updated)) => Ok(updated),
        // the account was deleted between authentication and the write
        Ok(None) => Err(ApiError::Unauthorized),
        Err(err) if is_unique_violation(&err) => Err(email_taken_violation()),
        Err(err) => Err(err.into()),
    }
}

/// Soft delete plus token purge in one transaction. The row survives for
/// bookkeeping; every lookup, bearer auth included, stops seeing it and the
/// email becomes registrable again.
pub async fn delete_user(state: &AppState, user: &User) -> Result<(), ApiError> {
    let mut tx = state.db.begin().await?;
    token_repo::purge_for_user(&mut *tx, user.id).await?;
    User::soft_delete(&mut *tx, user.id).await?;
    tx.commit().await?;
    Ok(())
}
