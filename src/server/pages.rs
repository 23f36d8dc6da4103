//! Pages are rendered as JSON view models.

use super::flash::FlashMessages;
use super::session::RequestContext;
use crate::user::Caller;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

#[derive(Serialize)]
struct Page<'a, T: Serialize> {
    page_name: &'static str,
    flash: &'a FlashMessages,
    viewer: Option<&'a Caller>,
    #[serde(flatten)]
    data: T,
}

/// Renders a page, consuming the pending flash messages.
pub fn render<T: Serialize>(page_name: &'static str, ctx: &RequestContext, data: T) -> Response {
    let page = Page {
        page_name,
        flash: &ctx.flash,
        viewer: ctx.caller(),
        data,
    };
    let body = Json(page).into_response();
    if ctx.flash.is_empty() {
        body
    } else {
        (CookieJar::new().add(FlashMessages::clearing_cookie()), body).into_response()
    }
}

/// Page without data of its own.
#[derive(Serialize)]
pub struct Empty {}
