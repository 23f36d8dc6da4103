use super::auth::{AuthToken, AuthTokenValue};
use super::permissions::{Caller, Permission, UserRole};
use crate::catalog_store::{Category, Course, FullCatalogStore, NewUser, User};
use crate::error::{CatalogError, CatalogResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};
use validator::Validate;

pub const EMAIL_ALREADY_REGISTERED: &str = "Email is already registered";
pub const INVALID_ROLE: &str = "Please choose a valid role";

/// Roles a user may pick for themself when registering.
const SELF_ASSIGNABLE_ROLES: &[UserRole] = &[UserRole::Student, UserRole::Teacher];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please enter your name"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl RegisterForm {
    fn normalized(self) -> Self {
        RegisterForm {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
            role: self.role.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Validation messages in form field order.
    fn validation_messages(&self) -> Vec<String> {
        let Err(errors) = self.validate() else {
            return vec![];
        };
        let field_errors = errors.field_errors();
        let mut messages = vec![];
        for field in ["name", "email", "password"] {
            let Some(field_errors) = field_errors.get(field) else {
                continue;
            };
            for error in field_errors.iter() {
                match &error.message {
                    Some(message) => messages.push(message.to_string()),
                    None => messages.push(format!("Invalid {}", field)),
                }
            }
        }
        messages
    }

    fn has_valid_email(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(errors) => !errors.field_errors().contains_key("email"),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Everything shown on a user's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub enrolled_courses: Vec<Course>,
    pub owned_courses: Vec<Course>,
    pub categories: Vec<Category>,
    /// Only filled in for callers allowed to manage users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
}

pub struct UserManager {
    store: Arc<dyn FullCatalogStore>,
}

impl UserManager {
    pub fn new(store: Arc<dyn FullCatalogStore>) -> Self {
        Self { store }
    }

    pub fn register(&self, form: RegisterForm) -> CatalogResult<User> {
        let form = form.normalized();
        let mut messages = form.validation_messages();

        let role = match form.role.as_deref() {
            None => UserRole::Student,
            Some(raw) => match UserRole::from_str(raw.trim()) {
                Some(role) if SELF_ASSIGNABLE_ROLES.contains(&role) => role,
                _ => {
                    messages.push(INVALID_ROLE.to_string());
                    UserRole::Student
                }
            },
        };

        // Only look the email up once it is known to be well formed.
        if form.has_valid_email() && self.store.get_user_by_email(&form.email)?.is_some() {
            messages.push(EMAIL_ALREADY_REGISTERED.to_string());
        }

        if !messages.is_empty() {
            debug!("Rejected registration of {}: {:?}", form.email, messages);
            return Err(CatalogError::ValidationFailed(messages));
        }

        let user_id = self.store.create_user(
            &NewUser {
                name: form.name,
                email: form.email.clone(),
                role,
            },
            &form.password,
        )?;
        info!("Registered user {} with role {}", user_id, role);
        self.store
            .get_user(user_id)?
            .with_context(|| format!("User {} vanished right after creation", user_id))
            .map_err(CatalogError::from)
    }

    /// Verifies the password and opens a new session for the user.
    pub fn login(&self, email: &str, password: &str) -> CatalogResult<(User, AuthToken)> {
        let user = self
            .store
            .get_user_by_email(&normalize_email(email))?
            .ok_or(CatalogError::UserDoesNotExist)?;

        let credentials = self
            .store
            .get_password_credentials(user.id)?
            .ok_or(CatalogError::InvalidCredentials)?;

        let matches = credentials.verify(password)?;
        self.store.record_login_attempt(user.id, matches)?;
        if !matches {
            debug!("Wrong password for user {}", user.id);
            return Err(CatalogError::InvalidCredentials);
        }

        let token = AuthToken {
            user_id: user.id,
            created: SystemTime::now(),
            last_used: None,
            value: AuthTokenValue::generate(),
        };
        self.store.add_auth_token(&token)?;
        debug!("Opened session for user {}", user.id);
        Ok((user, token))
    }

    /// Returns false if the session did not exist.
    pub fn logout(&self, token: &AuthTokenValue) -> CatalogResult<bool> {
        Ok(self.store.delete_auth_token(token)?.is_some())
    }

    /// Resolves a session token into the caller, refreshing the token's last use.
    pub fn authenticate(&self, token: &AuthTokenValue) -> CatalogResult<Option<Caller>> {
        let Some(auth_token) = self.store.get_auth_token(token)? else {
            return Ok(None);
        };
        let Some(user) = self.store.get_user(auth_token.user_id)? else {
            return Ok(None);
        };
        if let Err(err) = self.store.touch_auth_token(token) {
            debug!("Failed to update auth token last_used timestamp: {}", err);
        }
        Ok(Some(Caller {
            user_id: user.id,
            role: user.role,
        }))
    }

    pub fn dashboard(&self, caller: &Caller) -> CatalogResult<Dashboard> {
        let user = self
            .store
            .get_user(caller.user_id)?
            .ok_or(CatalogError::NotFound("user"))?;
        let users = if user.role.has_permission(Permission::ManageUsers) {
            Some(self.store.get_all_users()?)
        } else {
            None
        };
        Ok(Dashboard {
            enrolled_courses: self.store.get_enrolled_courses(user.id)?,
            owned_courses: self.store.get_courses_by_owner(user.id)?,
            categories: self.store.get_all_categories()?,
            users,
            user,
        })
    }

    /// Deletes a user together with the courses they own.
    pub fn delete_user(&self, caller: &Caller, user_id: usize) -> CatalogResult<User> {
        if !caller.is_self_or(user_id, Permission::ManageUsers) {
            return Err(CatalogError::Forbidden);
        }
        let user = self
            .store
            .get_user(user_id)?
            .ok_or(CatalogError::NotFound("user"))?;
        match self.store.delete_user(user_id)? {
            Some(deleted_courses) => {
                info!(
                    "User {} deleted user {} and {} owned courses",
                    caller.user_id, user_id, deleted_courses
                );
                Ok(user)
            }
            None => Err(CatalogError::NotFound("user")),
        }
    }

    pub fn get_user_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        Ok(self.store.get_user_by_email(&normalize_email(email))?)
    }

    pub fn get_all_users(&self) -> CatalogResult<Vec<User>> {
        Ok(self.store.get_all_users()?)
    }

    pub fn set_user_role(&self, email: &str, role: UserRole) -> CatalogResult<User> {
        let user = self
            .get_user_by_email(email)?
            .ok_or(CatalogError::NotFound("user"))?;
        self.store.set_user_role(user.id, role)?;
        Ok(User { role, ..user })
    }

    /// Deletes a user without a caller, for local administration.
    pub fn force_delete_user(&self, email: &str) -> CatalogResult<usize> {
        let user = self
            .get_user_by_email(email)?
            .ok_or(CatalogError::NotFound("user"))?;
        self.store
            .delete_user(user.id)?
            .ok_or(CatalogError::NotFound("user"))
    }

    pub fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> CatalogResult<usize> {
        Ok(self.store.prune_unused_auth_tokens(unused_for_days)?)
    }
}
