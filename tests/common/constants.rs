//! Shared constants for end-to-end tests
//!
//! When seeded users or categories change, update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

pub const STUDENT_NAME: &str = "Sam Student";
pub const STUDENT_EMAIL: &str = "student@example.com";
pub const STUDENT_PASS: &str = "studentpass123";

pub const TEACHER_NAME: &str = "Tina Teacher";
pub const TEACHER_EMAIL: &str = "teacher@example.com";
pub const TEACHER_PASS: &str = "teacherpass123";

pub const OTHER_TEACHER_NAME: &str = "Otto Teacher";
pub const OTHER_TEACHER_EMAIL: &str = "other.teacher@example.com";
pub const OTHER_TEACHER_PASS: &str = "otherpass123";

pub const ADMIN_NAME: &str = "Ada Admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Categories
// ============================================================================

pub const PROGRAMMING_CATEGORY: &str = "Programming";
pub const PROGRAMMING_SLUG: &str = "programming";

pub const DESIGN_CATEGORY: &str = "Graphic Design";
pub const DESIGN_SLUG: &str = "graphic-design";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
