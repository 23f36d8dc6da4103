//! Error taxonomy shared by the managers and mapped to responses by the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected, each entry is a message that can be shown to the user.
    #[error("validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("user does not exist")]
    UserDoesNotExist,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The request carries no valid session.
    #[error("user not authenticated")]
    Unauthorized,

    /// The session user is not allowed to perform the operation.
    #[error("operation not permitted")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        CatalogError::ValidationFailed(vec![message.into()])
    }

    /// A message that is safe to show to the client.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::ValidationFailed(messages) => messages.join(" "),
            CatalogError::UserDoesNotExist => "User does not exist!".to_string(),
            CatalogError::InvalidCredentials => "Your password is incorrect!".to_string(),
            CatalogError::Unauthorized => "User not authenticated".to_string(),
            CatalogError::Forbidden => "You are not allowed to do that".to_string(),
            CatalogError::NotFound(what) => {
                let mut chars = what.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                }
            }
            CatalogError::Infrastructure(_) => "Something went wrong".to_string(),
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
