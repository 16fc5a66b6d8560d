use serde::{Deserialize, Serialize};

use super::validate;
use crate::error::ApiError;

/// Request body for registration. Every field is mandatory.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_phone: String,
    pub password: String,
    pub company: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();
        violations.extend(validate::required("first_name", &self.first_name));
        violations.extend(validate::required("last_name", &self.last_name));
        violations.extend(validate::required("company", &self.company));
        violations.extend(validate::email_format("email", &self.email));
        violations.extend(validate::mobile_phone("mobile_phone", &self.mobile_phone));
        violations.extend(validate::password_strength("password", &self.password));
        violations.extend(validate::password_not_email(
            "password",
            &self.password,
            &self.email,
        ));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

impl TokenRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();
        violations.extend(validate::required("email", &self.email));
        violations.extend(validate::required("password", &self.password));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Partial profile update; omitted fields stay untouched. Password and access
/// token cannot be changed through this body.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub company: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();
        if let Some(first_name) = self.first_name.as_deref() {
            violations.extend(validate::required("first_name", first_name));
        }
        if let Some(last_name) = self.last_name.as_deref() {
            violations.extend(validate::required("last_name", last_name));
        }
        if let Some(company) = self.company.as_deref() {
            violations.extend(validate::required("company", company));
        }
        if let Some(email) = self.email.as_deref() {
            violations.extend(validate::email_format("email", email));
        }
        if let Some(mobile_phone) = self.mobile_phone.as_deref() {
            violations.extend(validate::mobile_phone("mobile_phone", mobile_phone));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
    pub old_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();
        violations.extend(validate::required("new_password", &self.new_password));
        violations.extend(validate::required("old_password", &self.old_password));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestPasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub repeated_password: String,
}

impl ResetPasswordRequest {
    /// Everything checkable without the owning user; the equality-to-email
    /// rule runs later, once the token has resolved its owner.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();
        violations.extend(validate::required("repeated_password", &self.repeated_password));
        violations.extend(validate::password_strength("password", &self.password));
        violations.extend(validate::passwords_match(
            "repeated_password",
            &self.password,
            &self.repeated_password,
        ));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateResetTokenRequest {
    pub password_reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResetTokenResponse {
    pub is_valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmEmailRequest {
    pub confirmation_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@company.lt".into(),
            mobile_phone: "+37069037984".into(),
            password: "supersecret123ABC".into(),
            company: "Company".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register_request().validate().is_ok());
    }

    #[test]
    fn registration_collects_all_violations() {
        let request = RegisterRequest {
            first_name: "".into(),
            last_name: "".into(),
            email: "nonsense".into(),
            mobile_phone: "0690".into(),
            password: "short".into(),
            company: "".into(),
        };
        let Err(ApiError::Validation(violations)) = request.validate() else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert!(fields.contains(&"first_name"));
        assert!(fields.contains(&"last_name"));
        assert!(fields.contains(&"company"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"mobile_phone"));
        assert!(fields.contains(&"password"));
    }

    #[test]
    fn registration_rejects_password_equal_to_email() {
        let mut request = register_request();
        request.password = request.email.clone();
        let Err(ApiError::Validation(violations)) = request.validate() else {
            panic!("expected validation failure");
        };
        assert!(violations
            .iter()
            .any(|v| v.message == "The password should not be equal to email."));
    }

    #[test]
    fn update_ignores_absent_fields_but_checks_present_ones() {
        let request = UpdateUserRequest {
            first_name: Some("Valentino".into()),
            last_name: None,
            email: None,
            mobile_phone: None,
            company: None,
        };
        assert!(request.validate().is_ok());

        let request = UpdateUserRequest {
            first_name: None,
            last_name: None,
            email: Some("broken".into()),
            mobile_phone: Some("12345".into()),
            company: Some("  ".into()),
        };
        let Err(ApiError::Validation(violations)) = request.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn reset_requires_matching_repeated_password() {
        let request = ResetPasswordRequest {
            password: "supersecret123ABC123".into(),
            repeated_password: "supersecret123ABC123".into(),
        };
        assert!(request.validate().is_ok());

        let request = ResetPasswordRequest {
            password: "supersecret123ABC123".into(),
            repeated_password: "something-else".into(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn access_token_response_shape() {
        let json = serde_json::to_string(&AccessTokenResponse {
            access_token: "EOryR8qub5XiiNm9oyLIFZ4iKHP662UC".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            "{\"access_token\":\"EOryR8qub5XiiNm9oyLIFZ4iKHP662UC\"}"
        );
    }
}
