//! Maps [`CatalogError`] to HTTP responses.

use super::flash::FlashMessages;
use crate::error::CatalogError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct FailureBody {
    status: &'static str,
    message: String,
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::ValidationFailed(_)
            | CatalogError::UserDoesNotExist
            | CatalogError::InvalidCredentials => StatusCode::BAD_REQUEST,
            CatalogError::Unauthorized => StatusCode::UNAUTHORIZED,
            CatalogError::Forbidden => StatusCode::FORBIDDEN,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(super) fn log_if_unexpected(&self) {
        if let CatalogError::Infrastructure(err) = self {
            error!("Request failed: {:#}", err);
        }
    }
}

/// JSON failure body, infrastructure details only go to the log.
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log_if_unexpected();
        let body = FailureBody {
            status: "fail",
            message: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// A non-redirect status pointing the client back at a form, with the flash to show there.
pub fn back_to(status: StatusCode, location: &'static str, flash: FlashMessages) -> Response {
    (status, flash, [(header::LOCATION, location)]).into_response()
}
