//! Storage traits for users, sessions, categories, courses and enrollments.

use super::models::{
    Category, Course, CourseDetails, CourseFilter, CourseUpdate, NewCourse, NewUser, User,
};
use crate::user::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use crate::user::UserRole;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user together with its password credentials and returns the user id.
    /// Fails if the email is already registered.
    fn create_user(&self, new_user: &NewUser, password: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: usize) -> Result<Option<User>>;

    /// Returns Ok(None) if no user is registered with the given email.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    fn get_all_users(&self) -> Result<Vec<User>>;

    fn set_user_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Deletes a user and every course they own, in one transaction.
    /// Returns Ok(None) if the user does not exist, otherwise the number of deleted courses.
    fn delete_user(&self, user_id: usize) -> Result<Option<usize>>;
}

pub trait UserCredentialsStore: Send + Sync {
    /// Returns Ok(None) if the user has no password credentials.
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>>;

    /// Records a login attempt, `success` also updates the last used timestamp.
    fn record_login_attempt(&self, user_id: usize, success: bool) -> Result<()>;
}

pub trait AuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns the deleted token, Ok(None) if it did not exist.
    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()>;

    /// Deletes tokens not used for the given number of days, returns how many were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait CategoryStore: Send + Sync {
    /// Creates a category, its slug derived from the name.
    fn create_category(&self, name: &str) -> Result<Category>;

    fn get_category(&self, category_id: usize) -> Result<Option<Category>>;

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    fn get_all_categories(&self) -> Result<Vec<Category>>;
}

pub trait CourseStore: Send + Sync {
    /// Creates a course, its slug derived from the name.
    fn create_course(&self, new_course: &NewCourse) -> Result<Course>;

    fn get_course(&self, course_id: usize) -> Result<Option<Course>>;

    fn get_course_details(&self, slug: &str) -> Result<Option<CourseDetails>>;

    /// Courses matching the filter, newest first.
    fn find_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseDetails>>;

    /// Courses owned by the given user, newest first.
    fn get_courses_by_owner(&self, owner_id: usize) -> Result<Vec<Course>>;

    /// Returns Ok(None) if no course has the given slug.
    fn update_course(&self, slug: &str, update: &CourseUpdate) -> Result<Option<Course>>;

    /// Returns the deleted course, Ok(None) if no course has the given slug.
    fn delete_course(&self, slug: &str) -> Result<Option<Course>>;
}

pub trait EnrollmentStore: Send + Sync {
    /// Returns false if the user was already enrolled.
    fn enroll(&self, user_id: usize, course_id: usize) -> Result<bool>;

    /// Returns the number of removed enrollments.
    fn release(&self, user_id: usize, course_id: usize) -> Result<usize>;

    /// Enrolled courses in enrollment order.
    fn get_enrolled_courses(&self, user_id: usize) -> Result<Vec<Course>>;

    fn is_enrolled(&self, user_id: usize, course_id: usize) -> Result<bool>;
}

/// Combined trait for the whole catalog storage
pub trait FullCatalogStore:
    UserStore + UserCredentialsStore + AuthTokenStore + CategoryStore + CourseStore + EnrollmentStore
{
}

impl<T> FullCatalogStore for T where
    T: UserStore
        + UserCredentialsStore
        + AuthTokenStore
        + CategoryStore
        + CourseStore
        + EnrollmentStore
{
}
