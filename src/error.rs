use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

use crate::users::validate::Violation;

/// Failure taxonomy of the identity core. Handlers return these untouched;
/// only `into_response` below speaks HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<Violation>),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("invalid credentials")]
    Unauthorized,

    /// Security token absent, expired, or owned by another user. The cases
    /// are deliberately indistinguishable to the caller.
    #[error("token not found or no longer valid")]
    InvalidToken,

    #[error("upstream gateway failure: {0}")]
    Upstream(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(violations) => {
                let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
                for v in violations {
                    errors.entry(v.field).or_default().push(v.message);
                }
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!(errors))).into_response()
            }
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials.").into_response()
            }
            ApiError::InvalidToken => (
                StatusCode::NOT_FOUND,
                "Token not found or no longer valid.",
            )
                .into_response(),
            ApiError::Upstream(gateway) => {
                error!(gateway, "upstream gateway failure");
                (StatusCode::BAD_GATEWAY, "Upstream gateway failure.").into_response()
            }
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::validate::Violation;

    #[test]
    fn validation_maps_to_422() {
        let err = ApiError::Validation(vec![Violation {
            field: "email",
            message: "The email must be a valid email address.".into(),
        }]);
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError::Conflict("Email already registered.");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn invalid_token_maps_to_404() {
        assert_eq!(
            ApiError::InvalidToken.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_maps_to_500_without_leaking_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn validation_body_groups_messages_by_field() {
        let err = ApiError::Validation(vec![
            Violation {
                field: "password",
                message: "The password must be at least 8 characters.".into(),
            },
            Violation {
                field: "password",
                message:
                    "The password must have at least 1 number, letter, special symbol or upper case latter."
                        .into(),
            },
        ]);
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["password"].as_array().map(|a| a.len()), Some(2));
    }
}
