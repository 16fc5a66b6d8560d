use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::error;

use super::repo::User;
use crate::state::AppState;

/// Resolves the bearer access token to its owning account once, at the
/// boundary. Handlers receive the full `User` and never touch the header.
pub struct AuthUser(pub User);

pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "missing Authorization header".to_string(),
            ))?;

        let token = bearer_token(auth)
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))?;

        let user = User::find_by_access_token(&state.db, token)
            .await
            .map_err(|e| {
                error!(error = %e, "access token lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            })?
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "invalid or expired token".to_string(),
            ))?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bearer_prefix() {
        assert_eq!(
            bearer_token("Bearer EOryR8qub5XiiNm9oyLIFZ4iKHP662UC"),
            Some("EOryR8qub5XiiNm9oyLIFZ4iKHP662UC")
        );
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("EOryR8qub5XiiNm9oyLIFZ4iKHP662UC"), None);
    }
}
