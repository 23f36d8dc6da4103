use crate::catalog_store::{
    slugify, Category, Course, CourseDetails, CourseFilter, CourseUpdate, FullCatalogStore,
    NewCourse, User,
};
use crate::error::{CatalogError, CatalogResult};
use crate::user::{Caller, Permission};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

pub const INVALID_CATEGORY: &str = "Please choose a valid category";

/// Course fields as submitted by the create and update forms.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CourseForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please enter a course name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Category id.
    #[serde(default)]
    pub category: String,
}

/// Listing filters from the query string, empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CourseQuery {
    pub categories: Option<String>,
    pub search: Option<String>,
}

impl CourseQuery {
    fn normalized(&self) -> CourseQuery {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        CourseQuery {
            categories: non_empty(&self.categories),
            search: non_empty(&self.search),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseListing {
    pub courses: Vec<CourseDetails>,
    pub categories: Vec<Category>,
    pub filters: CourseQuery,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursePage {
    pub course: CourseDetails,
    /// The logged in user looking at the course, if any.
    pub current_user: Option<User>,
    pub is_enrolled: bool,
    pub categories: Vec<Category>,
}

pub struct CourseManager {
    store: Arc<dyn FullCatalogStore>,
}

impl CourseManager {
    pub fn new(store: Arc<dyn FullCatalogStore>) -> Self {
        Self { store }
    }

    /// Trims and checks the form, resolving the category it points at.
    fn validated_fields(&self, form: &CourseForm) -> CatalogResult<CourseUpdate> {
        let form = CourseForm {
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            category: form.category.trim().to_string(),
        };
        let mut messages: Vec<String> = match form.validate() {
            Ok(()) => vec![],
            Err(errors) => errors
                .field_errors()
                .values()
                .flat_map(|errors| errors.iter())
                .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .collect(),
        };

        let category = match form.category.parse::<usize>() {
            Ok(category_id) => self.store.get_category(category_id)?,
            Err(_) => None,
        };
        if category.is_none() {
            messages.push(INVALID_CATEGORY.to_string());
        }

        match category {
            Some(category) if messages.is_empty() => Ok(CourseUpdate {
                name: form.name,
                description: form.description,
                category_id: category.id,
            }),
            _ => Err(CatalogError::ValidationFailed(messages)),
        }
    }

    pub fn create(&self, caller: &Caller, form: &CourseForm) -> CatalogResult<Course> {
        if !caller.has_permission(Permission::CreateCourses) {
            return Err(CatalogError::Forbidden);
        }
        let fields = self.validated_fields(form)?;
        let course = self.store.create_course(&NewCourse {
            name: fields.name,
            description: fields.description,
            category_id: fields.category_id,
            owner_id: caller.user_id,
        })?;
        info!(
            "User {} created course {} ({})",
            caller.user_id, course.id, course.slug
        );
        Ok(course)
    }

    pub fn list(&self, query: &CourseQuery) -> CatalogResult<CourseListing> {
        let filters = query.normalized();
        let categories = self.store.get_all_categories()?;

        let category_id = match &filters.categories {
            None => None,
            Some(slug) => match categories.iter().find(|c| &c.slug == slug) {
                Some(category) => Some(category.id),
                None => {
                    debug!("Unknown category {} requested", slug);
                    return Ok(CourseListing {
                        courses: vec![],
                        categories,
                        filters,
                    });
                }
            },
        };

        let courses = self.store.find_courses(&CourseFilter {
            category_id,
            name_contains: filters.search.clone(),
        })?;
        Ok(CourseListing {
            courses,
            categories,
            filters,
        })
    }

    pub fn detail(&self, caller: Option<&Caller>, slug: &str) -> CatalogResult<CoursePage> {
        let course = self
            .store
            .get_course_details(slug)?
            .ok_or(CatalogError::NotFound("course"))?;
        let viewer = match caller {
            Some(caller) => self.store.get_user(caller.user_id)?,
            None => None,
        };
        let is_enrolled = match &viewer {
            Some(user) => self.store.is_enrolled(user.id, course.course.id)?,
            None => false,
        };
        Ok(CoursePage {
            course,
            current_user: viewer,
            is_enrolled,
            categories: self.store.get_all_categories()?,
        })
    }

    fn enrollment_target(&self, caller: &Caller, course_id: usize) -> CatalogResult<Course> {
        if !caller.has_permission(Permission::EnrollCourses) {
            return Err(CatalogError::Forbidden);
        }
        if self.store.get_user(caller.user_id)?.is_none() {
            return Err(CatalogError::NotFound("user"));
        }
        self.store
            .get_course(course_id)?
            .ok_or(CatalogError::NotFound("course"))
    }

    /// Adds the course to the caller's list, once.
    pub fn enroll(&self, caller: &Caller, course_id: usize) -> CatalogResult<Course> {
        let course = self.enrollment_target(caller, course_id)?;
        if !self.store.enroll(caller.user_id, course.id)? {
            debug!(
                "User {} already enrolled in course {}",
                caller.user_id, course.id
            );
        }
        Ok(course)
    }

    /// Removes the course from the caller's list, a no-op if it was not there.
    pub fn release(&self, caller: &Caller, course_id: usize) -> CatalogResult<Course> {
        let course = self.enrollment_target(caller, course_id)?;
        self.store.release(caller.user_id, course.id)?;
        Ok(course)
    }

    fn owned_course(&self, caller: &Caller, slug: &str) -> CatalogResult<Course> {
        let course = self
            .store
            .get_course_details(slug)?
            .ok_or(CatalogError::NotFound("course"))?
            .course;
        if !caller.is_self_or(course.owner_id, Permission::ManageAllCourses) {
            return Err(CatalogError::Forbidden);
        }
        Ok(course)
    }

    pub fn delete(&self, caller: &Caller, slug: &str) -> CatalogResult<Course> {
        let course = self.owned_course(caller, slug)?;
        let deleted = self
            .store
            .delete_course(&course.slug)?
            .ok_or(CatalogError::NotFound("course"))?;
        info!("User {} deleted course {}", caller.user_id, deleted.id);
        Ok(deleted)
    }

    pub fn update(&self, caller: &Caller, slug: &str, form: &CourseForm) -> CatalogResult<Course> {
        let course = self.owned_course(caller, slug)?;
        let fields = self.validated_fields(form)?;
        let updated = self
            .store
            .update_course(&course.slug, &fields)?
            .ok_or(CatalogError::NotFound("course"))?;
        info!(
            "User {} updated course {} ({})",
            caller.user_id, updated.id, updated.slug
        );
        Ok(updated)
    }

    pub fn add_category(&self, name: &str) -> CatalogResult<Category> {
        let name = name.trim();
        if slugify(name, "").is_empty() {
            return Err(CatalogError::validation("Please enter a category name"));
        }
        Ok(self.store.create_category(name)?)
    }

    pub fn get_categories(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.store.get_all_categories()?)
    }
}
