//! Bearer token port.

use uuid::Uuid;

use crate::domain::{Identity, Role};

/// Claims carried by an access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub name: Option<String>,
    pub exp: i64,
}

impl TokenClaims {
    pub fn identity(&self) -> Identity {
        let identity = Identity::new(self.user_id, Role::from_claims(&self.roles));
        match &self.name {
            Some(name) => identity.with_display_name(name.as_str()),
            None => identity,
        }
    }
}

/// Token service trait for access token operations.
///
/// Tokens are issued by the external identity provider; issuing here exists
/// for development tooling and tests.
pub trait TokenService: Send + Sync {
    /// Generate an access token carrying `identity`.
    fn generate_token(&self, identity: &Identity) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,
}
