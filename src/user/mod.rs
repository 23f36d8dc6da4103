pub mod auth;
pub mod permissions;
mod user_manager;

pub use auth::{AuthToken, AuthTokenValue, PasswordCredentials};
pub use permissions::{Caller, Permission, UserRole};
pub use user_manager::{Dashboard, RegisterForm, UserManager, EMAIL_ALREADY_REGISTERED};
