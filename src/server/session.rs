use super::flash::FlashMessages;
use super::state::ServerState;
use crate::error::CatalogError;
use crate::user::auth::AuthTokenValue;
use crate::user::Caller;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

#[derive(Debug, Clone)]
pub struct Session {
    pub caller: Caller,
    pub token: AuthTokenValue,
}

impl Session {
    pub fn user_id(&self) -> usize {
        self.caller.user_id
    }

    /// The cookie handed out on login.
    pub fn cookie(token: &AuthTokenValue) -> Cookie<'static> {
        Cookie::build((COOKIE_SESSION_TOKEN_KEY, token.0.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    pub fn clearing_cookie() -> Cookie<'static> {
        Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
            .path("/")
            .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Per request view of who is calling and which notices are pending for them.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
    pub flash: FlashMessages,
}

impl RequestContext {
    pub fn caller(&self) -> Option<&Caller> {
        self.session.as_ref().map(|s| &s.caller)
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?;
    let value = String::from_utf8_lossy(value.as_bytes());
    let token = value.strip_prefix("Bearer ").unwrap_or(&value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, CatalogError> {
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Ok(None);
        }
        Some(x) => AuthTokenValue(x),
    };

    match ctx.user_manager.authenticate(&token)? {
        Some(caller) => {
            debug!("Found session of user_id={}", caller.user_id);
            Ok(Some(Session { caller, token }))
        }
        None => {
            debug!("Auth token not found in database");
            Ok(None)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)?.ok_or(CatalogError::Unauthorized)
    }
}

impl FromRequestParts<ServerState> for RequestContext {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestContext {
            session: extract_session_from_request_parts(parts, ctx)?,
            flash: FlashMessages::from_headers(&parts.headers),
        })
    }
}
