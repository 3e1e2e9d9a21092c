//! Domain service for admin accounts and sessions.
//!
//! Sign-up, sign-in, session lookup by access token and sign-out. The local
//! implementation keeps accounts in the catalog database; the remote one
//! delegates to the hosted data service's auth endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Sign-up is disabled")]
    SignupDisabled,

    #[error("An account with this email already exists")]
    AlreadyExists,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Auth provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

/// Sign-up result. Providers that require email confirmation return no session.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpResult {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed email or short password
    /// and [`AuthError::AlreadyExists`] for a taken email.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolves an access token to its user, `None` if the token is unknown or expired.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Basic shape check shared by implementations.
pub fn validate_credentials(
    email: &str,
    password: &str,
    min_password_length: usize,
) -> Result<(), AuthError> {
    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AuthError::Validation("A valid email is required".to_string()));
    }

    if password.chars().count() < min_password_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {min_password_length} characters"
        )));
    }

    Ok(())
}
