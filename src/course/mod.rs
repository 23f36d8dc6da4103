mod course_manager;

pub use course_manager::{
    CourseForm, CourseListing, CourseManager, CoursePage, CourseQuery, INVALID_CATEGORY,
};
