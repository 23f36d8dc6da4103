//! One-shot user notices carried across a redirect in the `flash` cookie.
//!
//! The cookie value is the base64url encoded JSON list of messages. It is
//! written by the redirecting response and cleared once a page shows it.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::debug;

pub const COOKIE_FLASH_KEY: &str = "flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashMessages(Vec<FlashMessage>);

impl FlashMessages {
    pub fn success<S: Into<String>>(message: S) -> Self {
        let mut flash = FlashMessages::default();
        flash.push(FlashKind::Success, message);
        flash
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        let mut flash = FlashMessages::default();
        flash.push(FlashKind::Error, message);
        flash
    }

    pub fn errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flash = FlashMessages::default();
        for message in messages {
            flash.push(FlashKind::Error, message);
        }
        flash
    }

    pub fn push<S: Into<String>>(&mut self, kind: FlashKind, message: S) {
        self.0.push(FlashMessage {
            kind,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> String {
        // Serializing plain strings and unit variants cannot fail.
        let json = serde_json::to_vec(&self.0).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Returns None for anything that is not a value produced by `encode`.
    pub fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice::<Vec<FlashMessage>>(&json)
            .ok()
            .map(FlashMessages)
    }

    /// Reads the messages left by the previous response, a malformed cookie counts as none.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        match jar.get(COOKIE_FLASH_KEY) {
            None => FlashMessages::default(),
            Some(cookie) => FlashMessages::decode(cookie.value()).unwrap_or_else(|| {
                debug!("Ignoring malformed flash cookie");
                FlashMessages::default()
            }),
        }
    }

    fn cookie(&self) -> Cookie<'static> {
        Cookie::build((COOKIE_FLASH_KEY, self.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    /// A cookie that removes the flash messages from the client.
    pub fn clearing_cookie() -> Cookie<'static> {
        Cookie::build((COOKIE_FLASH_KEY, ""))
            .path("/")
            .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Appends a `Set-Cookie` header carrying the messages, if there are any.
impl IntoResponseParts for FlashMessages {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.is_empty() {
            return Ok(res);
        }
        if let Ok(value) = HeaderValue::from_str(&self.cookie().to_string()) {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}
