//! Account store backed by the local catalog database.

use crate::config::AuthConfig;
use crate::db::Store;
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, AuthUser, SignUpResult, validate_credentials,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

struct IssuedToken {
    user: AuthUser,
    issued_at: Instant,
}

/// Users table with argon2 hashes; access tokens live in memory only and
/// expire `token_ttl` after they were issued.
pub struct LocalAuthService {
    store: Store,
    config: AuthConfig,
    token_ttl: Duration,
    tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl LocalAuthService {
    #[must_use]
    pub fn new(store: Store, config: AuthConfig, token_ttl: Duration) -> Self {
        Self {
            store,
            config,
            token_ttl,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    async fn issue_token(&self, user: AuthUser) -> AuthSession {
        let access_token = uuid::Uuid::new_v4().simple().to_string();
        let mut tokens = self.tokens.write().await;

        let before = tokens.len();
        tokens.retain(|_, issued| issued.issued_at.elapsed() < self.token_ttl);
        if tokens.len() < before {
            debug!(pruned = before - tokens.len(), "Expired access tokens dropped");
        }

        tokens.insert(
            access_token.clone(),
            IssuedToken {
                user: user.clone(),
                issued_at: Instant::now(),
            },
        );
        AuthSession { access_token, user }
    }

    pub async fn active_tokens(&self) -> usize {
        self.tokens.read().await.len()
    }
}

fn auth_user(user: crate::db::User) -> AuthUser {
    AuthUser {
        id: user.id.to_string(),
        email: user.email,
    }
}

#[async_trait]
impl AuthService for LocalAuthService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError> {
        if !self.config.allow_signup {
            return Err(AuthError::SignupDisabled);
        }
        validate_credentials(email, password, self.config.min_password_length)?;

        let email = email.trim().to_lowercase();
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let user = auth_user(self.store.create_user(&email, password, &self.config).await?);
        info!(email = %user.email, "Account created");

        let session = self.issue_token(user.clone()).await;
        Ok(SignUpResult {
            user,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .verify_user_password(&email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(self.issue_token(auth_user(user)).await)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let expired = match self.tokens.read().await.get(access_token) {
            Some(issued) if issued.issued_at.elapsed() < self.token_ttl => {
                return Ok(Some(issued.user.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.tokens.write().await.remove(access_token);
        }
        Ok(None)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.write().await.remove(access_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn fast_config() -> AuthConfig {
        AuthConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..AuthConfig::default()
        }
    }

    #[tokio::test]
    async fn sign_up_sign_in_and_out() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let auth = LocalAuthService::new(store, fast_config(), HOUR);

        let created = auth.sign_up("Admin@Shop.example", "battery").await.unwrap();
        assert_eq!(created.user.email, "admin@shop.example");
        assert!(created.session.is_some());

        let dup = auth.sign_up("admin@shop.example", "battery").await;
        assert!(matches!(dup, Err(AuthError::AlreadyExists)));

        let bad = auth.sign_in("admin@shop.example", "wrong-pass").await;
        assert!(matches!(bad, Err(AuthError::InvalidCredentials)));

        let session = auth.sign_in("admin@shop.example", "battery").await.unwrap();
        let user = auth.get_user(&session.access_token).await.unwrap();
        assert_eq!(user, Some(session.user.clone()));

        auth.sign_out(&session.access_token).await.unwrap();
        assert!(auth.get_user(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_up_can_be_disabled() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let auth = LocalAuthService::new(
            store,
            AuthConfig {
                allow_signup: false,
                ..fast_config()
            },
            HOUR,
        );

        let result = auth.sign_up("admin@shop.example", "battery").await;
        assert!(matches!(result, Err(AuthError::SignupDisabled)));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected_and_pruned() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let auth = LocalAuthService::new(store, fast_config(), Duration::from_millis(50));

        let created = auth.sign_up("admin@shop.example", "battery").await.unwrap();
        let first = created.session.unwrap().access_token;
        assert!(auth.get_user(&first).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(auth.get_user(&first).await.unwrap().is_none());
        assert_eq!(auth.active_tokens().await, 0);

        let second = auth.sign_in("admin@shop.example", "battery").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        auth.sign_in("admin@shop.example", "battery").await.unwrap();
        assert_eq!(auth.active_tokens().await, 1, "older token pruned on issue");
        assert!(auth.get_user(&second.access_token).await.unwrap().is_none());
    }
}
