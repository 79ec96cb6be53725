use async_trait::async_trait;

use super::ApiError;

/// What the identity provider hands back after a successful signup or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub email: String,
    pub user_id: String,
    pub token: String,
    /// Validity window of `token`, relative to the moment the response arrived.
    pub expires_in_secs: i64,
}

/// The two password-based operations SessionManager needs from an identity
/// provider.
#[async_trait]
pub trait IdentityEndpoint: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError>;

    /// Sign in to an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError>;
}
