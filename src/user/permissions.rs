use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    EnrollCourses,
    CreateCourses,
    /// Edit or delete courses owned by someone else.
    ManageAllCourses,
    /// See every user and delete other users.
    ManageUsers,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::EnrollCourses,
    Permission::CreateCourses,
    Permission::ManageAllCourses,
    Permission::ManageUsers,
];
const TEACHER_PERMISSIONS: &[Permission] = &[Permission::EnrollCourses, Permission::CreateCourses];
const STUDENT_PERMISSIONS: &[Permission] = &[Permission::EnrollCourses];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Student, UserRole::Teacher, UserRole::Admin];

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::Teacher => TEACHER_PERMISSIONS,
            UserRole::Student => STUDENT_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "teacher" => Some(UserRole::Teacher),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub user_id: usize,
    pub role: UserRole,
}

impl Caller {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// True for the user themself or for anyone holding `permission`.
    pub fn is_self_or(&self, user_id: usize, permission: Permission) -> bool {
        self.user_id == user_id || self.has_permission(permission)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
