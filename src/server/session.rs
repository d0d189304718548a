use super::state::ServerState;
use crate::user::auth::AuthTokenValue;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{debug, error};

#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    AccessDenied,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<String> {
    // CookieJar extraction is infallible.
    let jar = CookieJar::from_request_parts(parts, ctx).await.ok()?;
    jar.get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &mut Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .map(|v| match v.strip_prefix("Bearer ") {
            Some(token) => token.to_string(),
            None => v,
        })
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    debug!("extracting session from request parts...");
    let token = match extract_session_token_from_cookies(parts, ctx)
        .await
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Ok(None);
        }
        Some(x) => x,
    };

    let user_manager = ctx.user_manager.lock().map_err(|_| {
        error!("User manager lock poisoned");
        SessionExtractionError::InternalError
    })?;
    match user_manager.get_auth_token(&AuthTokenValue(token)) {
        Ok(Some(auth_token)) => {
            debug!("Found auth token for user_id={}", auth_token.user_id);
            Ok(Some(Session {
                user_id: auth_token.user_id,
                token: auth_token.value.0,
            }))
        }
        Ok(None) => {
            debug!("Auth token not found in database");
            Ok(None)
        }
        Err(e) => {
            error!("Failed to get auth token from database: {}", e);
            Err(SessionExtractionError::InternalError)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::AccessDenied)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}
