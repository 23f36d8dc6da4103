//! Models stored in the catalog database.

use crate::user::UserRole;
use serde::Serialize;

/// A registered user. Credentials live in their own table and never appear here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: usize,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created: i64,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: usize,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: usize,
    pub name: String,
    pub description: String,
    pub category_id: usize,
    pub owner_id: usize,
    pub slug: String,
    pub created: i64,
}

/// Public face of a course owner, as shown on catalog pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CourseOwner {
    pub id: usize,
    pub name: String,
}

/// A course with its owner and category resolved, as listed and shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub owner: CourseOwner,
    pub category: Category,
}

#[derive(Clone, Debug)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub category_id: usize,
    pub owner_id: usize,
}

#[derive(Clone, Debug)]
pub struct CourseUpdate {
    pub name: String,
    pub description: String,
    pub category_id: usize,
}

/// Filter for course listing. Absent fields do not restrict the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub category_id: Option<usize>,
    /// Case-insensitive substring of the course name.
    pub name_contains: Option<String>,
}
