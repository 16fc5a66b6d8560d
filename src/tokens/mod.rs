use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

pub mod repo;

/// 32 alphanumeric characters, just under 191 bits of entropy from the OS
/// generator. Used for both bearer access tokens and security tokens.
pub const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    PasswordReset,
    EmailConfirmation,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::PasswordReset => "password_reset",
            TokenKind::EmailConfirmation => "email_confirmation",
        }
    }
}

pub fn opaque_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_token_is_printable_and_fixed_length() {
        let token = opaque_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn opaque_tokens_do_not_repeat() {
        let a = opaque_token();
        let b = opaque_token();
        assert_ne!(a, b);
    }

    #[test]
    fn kind_round_trips_to_storage_form() {
        assert_eq!(TokenKind::PasswordReset.as_str(), "password_reset");
        assert_eq!(TokenKind::EmailConfirmation.as_str(), "email_confirmation");
    }
}
