use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// One failed field-level check. Requests collect every violation before
/// failing, so clients see the full list at once.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+[0-9]+$").unwrap();
}

const PASSWORD_SYMBOLS: &str = "#?!@$%^&*-";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_mobile_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn required(field: &'static str, value: &str) -> Option<Violation> {
    if value.trim().is_empty() {
        return Some(Violation {
            field,
            message: format!("The \"{field}\" field cannot be blank."),
        });
    }
    None
}

pub fn email_format(field: &'static str, value: &str) -> Option<Violation> {
    if !is_valid_email(value) {
        return Some(Violation {
            field,
            message: format!("The {field} must be a valid email address."),
        });
    }
    None
}

pub fn mobile_phone(field: &'static str, value: &str) -> Option<Violation> {
    if !is_valid_mobile_phone(value) {
        return Some(Violation {
            field,
            message: "The mobile phone must start with a + sign and consist of numbers only."
                .into(),
        });
    }
    None
}

/// Minimum length plus character classes: at least one lowercase letter, one
/// digit, and one uppercase letter or symbol. The upstream rule was a single
/// lookahead regex; the regex crate has no lookahead, so each class is its
/// own predicate.
pub fn password_strength(field: &'static str, value: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    if value.chars().count() < 8 {
        violations.push(Violation {
            field,
            message: format!("The {field} must be at least 8 characters."),
        });
    }
    let has_lowercase = value.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_upper_or_symbol = value
        .chars()
        .any(|c| c.is_ascii_uppercase() || PASSWORD_SYMBOLS.contains(c));
    if !(has_lowercase && has_digit && has_upper_or_symbol) {
        violations.push(Violation {
            field,
            message:
                "The password must have at least 1 number, letter, special symbol or upper case latter."
                    .into(),
        });
    }
    violations
}

pub fn password_not_email(field: &'static str, password: &str, email: &str) -> Option<Violation> {
    if !email.is_empty() && password.eq_ignore_ascii_case(email) {
        return Some(Violation {
            field,
            message: "The password should not be equal to email.".into(),
        });
    }
    None
}

pub fn passwords_match(
    field: &'static str,
    password: &str,
    repeated: &str,
) -> Option<Violation> {
    if password != repeated {
        return Some(Violation {
            field,
            message: format!("The {field} must match the password."),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(is_valid_email("john.doe@company.lt"));
        assert!(!is_valid_email("john.doe@company"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn phone_must_be_plus_then_digits() {
        assert!(is_valid_mobile_phone("+37069037984"));
        assert!(!is_valid_mobile_phone("37069037984"));
        assert!(!is_valid_mobile_phone("+370 690 37984"));
        assert!(!is_valid_mobile_phone("+"));
    }

    #[test]
    fn required_rejects_blank_values() {
        assert!(required("first_name", "").is_some());
        assert!(required("first_name", "   ").is_some());
        assert!(required("first_name", "John").is_none());
    }

    #[test]
    fn strong_password_with_uppercase_passes() {
        assert!(password_strength("password", "supersecret123ABC").is_empty());
    }

    #[test]
    fn strong_password_with_symbol_passes() {
        assert!(password_strength("password", "supersecret123#").is_empty());
    }

    #[test]
    fn password_without_digit_fails() {
        let violations = password_strength("password", "supersecretABC");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "password");
    }

    #[test]
    fn password_without_uppercase_or_symbol_fails() {
        assert_eq!(password_strength("password", "supersecret123").len(), 1);
    }

    #[test]
    fn short_weak_password_reports_both_violations() {
        let violations = password_strength("password", "abc");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn password_equal_to_email_is_rejected() {
        assert!(password_not_email("password", "john@company.lt", "john@company.lt").is_some());
        assert!(password_not_email("password", "John@Company.LT", "john@company.lt").is_some());
        assert!(password_not_email("password", "supersecret123ABC", "john@company.lt").is_none());
    }

    #[test]
    fn repeated_password_must_match() {
        assert!(passwords_match("repeated_password", "a1B#efgh", "a1B#efgh").is_none());
        assert!(passwords_match("repeated_password", "a1B#efgh", "different").is_some());
    }
}
