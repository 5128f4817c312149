//! Registration, login, credential refresh and the bearer middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use shici_common::Error;
use tracing::debug;

use super::response::{created, ok, Envelope};
use crate::account::{
    extract_bearer, AuthResponse, IssuedCredential, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Rejects requests without a valid `Authorization: Bearer` credential
/// belonging to an active user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = extract_bearer(header)
        .ok_or_else(|| Error::InvalidToken("missing bearer credential".into()))?
        .to_string();

    let user = state.accounts.authenticate(&token).await?;
    debug!("Authenticated user {} for {}", user.id, request.uri().path());

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(request).await)
}

/// POST /api/v2/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<AuthResponse>>)> {
    Ok(created(state.accounts.register(body).await?))
}

/// POST /api/v2/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Envelope<AuthResponse>>> {
    Ok(ok(state.accounts.login(body).await?))
}

/// POST /api/v2/auth/refresh
///
/// Accepts the credential in the body or, failing that, the bearer header.
pub async fn refresh(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Json<Envelope<IssuedCredential>>> {
    let from_header = extract_bearer(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()));
    let token = match (&body, from_header) {
        (Some(Json(request)), _) if !request.token.trim().is_empty() => request.token.trim(),
        (_, Some(token)) => token,
        _ => return Err(Error::InvalidToken("missing credential".into()).into()),
    };
    Ok(ok(state.accounts.refresh_credential(token).await?))
}
