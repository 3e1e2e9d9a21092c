use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, CredentialsRequest, MessageResponse, SessionResponse,
    SignUpResponse,
};
use crate::services::AuthUser;

const SESSION_TOKEN_KEY: &str = "access_token";

// ============================================================================
// Middleware
// ============================================================================

/// Admin gate. Accepts the access token from:
/// 1. Session cookie (from login)
/// 2. `Authorization: Bearer <token>` header
///
/// The resolved [`AuthUser`] is added to the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request_token(&session, &headers).await;

    let Some(token) = token else {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };

    let Some(user) = state.auth().get_user(&token).await? else {
        return Err(ApiError::Unauthorized("Session expired".to_string()));
    };

    tracing::Span::current().record("user_id", user.email.as_str());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn request_token(session: &Session, headers: &HeaderMap) -> Option<String> {
    match session.get::<String>(SESSION_TOKEN_KEY).await {
        Ok(Some(token)) => Some(token),
        _ => bearer_token(headers),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

fn require_credentials(payload: &CredentialsRequest) -> Result<(), ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(())
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<SignUpResponse>>, ApiError> {
    require_credentials(&payload)?;

    let result = state
        .auth()
        .sign_up(&payload.email, &payload.password)
        .await?;

    let signed_in = if let Some(created) = &result.session {
        session
            .insert(SESSION_TOKEN_KEY, &created.access_token)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
        true
    } else {
        false
    };

    tracing::info!(email = %result.user.email, signed_in, "Sign-up completed");

    Ok(Json(ApiResponse::success(SignUpResponse {
        user: result.user,
        signed_in,
    })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    require_credentials(&payload)?;

    let signed_in = state
        .auth()
        .sign_in(&payload.email, &payload.password)
        .await?;

    session.cycle_id().await.ok();
    session
        .insert(SESSION_TOKEN_KEY, &signed_in.access_token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(SessionResponse {
        user: signed_in.user,
        access_token: Some(signed_in.access_token),
    })))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let token = request_token(&session, &headers).await;

    if let Some(token) = token {
        state.auth().sign_out(&token).await?;
    }
    session.flush().await.ok();

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /auth/session
/// Current user, or `null` data when signed out.
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<Option<SessionResponse>>>, ApiError> {
    let token = request_token(&session, &headers).await;

    let user: Option<AuthUser> = match token {
        Some(token) => state.auth().get_user(&token).await?,
        None => None,
    };

    Ok(Json(ApiResponse {
        success: true,
        data: Some(user.map(|user| SessionResponse {
            user,
            access_token: None,
        })),
        error: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123 "));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
