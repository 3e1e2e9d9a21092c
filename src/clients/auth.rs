use crate::clients::rest::error_message;
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, AuthUser, SignUpResult, validate_credentials,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Auth endpoints of the hosted data service (`/auth/v1`).
pub struct RemoteAuthService {
    client: Client,
    base_url: String,
    api_key: String,
    min_password_length: usize,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<RemoteUser> for AuthUser {
    fn from(user: RemoteUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

/// Sign-up answers with a session when confirmation is off, or the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(RemoteUser),
}

impl RemoteAuthService {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str, min_password_length: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            min_password_length,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn failure(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        debug!(status = status.as_u16(), %message, "Auth request rejected");

        match status {
            StatusCode::BAD_REQUEST if message.to_lowercase().contains("invalid login") => {
                AuthError::InvalidCredentials
            }
            StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("already") => {
                AuthError::AlreadyExists
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AuthError::Validation(message)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthError::Unauthorized,
            _ => AuthError::Provider(format!("{status}: {message}")),
        }
    }
}

#[async_trait]
impl AuthService for RemoteAuthService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError> {
        validate_credentials(email, password, self.min_password_length)?;

        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let parsed: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("unexpected sign-up response: {e}")))?;

        Ok(match parsed {
            SignUpResponse::Session(token) => {
                let user = AuthUser::from(token.user);
                SignUpResult {
                    session: Some(AuthSession {
                        access_token: token.access_token,
                        user: user.clone(),
                    }),
                    user,
                }
            }
            SignUpResponse::User(user) => SignUpResult {
                user: user.into(),
                session: None,
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("unexpected token response: {e}")))?;

        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user.into(),
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let user: RemoteUser = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Provider(format!("unexpected user response: {e}")))?;
                Ok(Some(user.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Remote sign-out failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_response_shapes() {
        let with_session: SignUpResponse = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"bearer","user":{"id":"u1","email":"a@b.co"}}"#,
        )
        .unwrap();
        assert!(matches!(with_session, SignUpResponse::Session(_)));

        let pending: SignUpResponse =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.co","confirmation_sent_at":"x"}"#)
                .unwrap();
        assert!(matches!(pending, SignUpResponse::User(_)));
    }

    #[test]
    fn test_endpoint() {
        let auth = RemoteAuthService::new(Client::new(), "https://project.example.co/", "anon", 6);
        assert_eq!(
            auth.endpoint("token?grant_type=password"),
            "https://project.example.co/auth/v1/token?grant_type=password"
        );
    }
}
