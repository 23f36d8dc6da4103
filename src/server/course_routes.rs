//! `/courses` routes: catalog browsing, course management and enrollment.

use super::auth_routes::LOGIN_REQUIRED;
use super::error::back_to;
use super::flash::FlashMessages;
use super::pages::render;
use super::session::{RequestContext, Session};
use super::state::{GuardedCourseManager, ServerState};
use crate::course::{CourseForm, CourseQuery};
use crate::error::CatalogError;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

pub const CREATE_FAILED: &str = "Something happened!";

#[derive(Deserialize)]
struct EnrollmentForm {
    #[serde(default)]
    course_id: String,
}

impl EnrollmentForm {
    fn course_id(&self) -> Result<usize, CatalogError> {
        self.course_id
            .trim()
            .parse::<usize>()
            .map_err(|_| CatalogError::NotFound("course"))
    }
}

async fn create_course(
    State(course_manager): State<GuardedCourseManager>,
    ctx: RequestContext,
    Form(form): Form<CourseForm>,
) -> Response {
    let Some(caller) = ctx.caller() else {
        return (FlashMessages::error(LOGIN_REQUIRED), Redirect::to("/login")).into_response();
    };
    match course_manager.create(caller, &form) {
        Ok(course) => (
            FlashMessages::success(format!("{} has been created successfully", course.name)),
            Redirect::to("/courses"),
        )
            .into_response(),
        Err(err @ CatalogError::Forbidden) => back_to(
            StatusCode::FORBIDDEN,
            "/courses",
            FlashMessages::error(err.user_message()),
        ),
        Err(err) => {
            match &err {
                CatalogError::Infrastructure(cause) => {
                    error!("Failed to create course: {:#}", cause)
                }
                other => debug!("Rejected course creation: {}", other),
            }
            back_to(
                StatusCode::BAD_REQUEST,
                "/courses",
                FlashMessages::error(CREATE_FAILED),
            )
        }
    }
}

async fn list_courses(
    State(course_manager): State<GuardedCourseManager>,
    ctx: RequestContext,
    Query(query): Query<CourseQuery>,
) -> Result<Response, CatalogError> {
    let listing = course_manager.list(&query)?;
    Ok(render("courses", &ctx, listing))
}

async fn get_course(
    State(course_manager): State<GuardedCourseManager>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Response, CatalogError> {
    let page = course_manager.detail(ctx.caller(), &slug)?;
    Ok(render("course", &ctx, page))
}

async fn enroll(
    State(course_manager): State<GuardedCourseManager>,
    session: Session,
    Form(form): Form<EnrollmentForm>,
) -> Result<Response, CatalogError> {
    let course = course_manager.enroll(&session.caller, form.course_id()?)?;
    Ok((
        FlashMessages::success(format!("You are enrolled in {}", course.name)),
        Redirect::to("/users/dashboard"),
    )
        .into_response())
}

async fn release(
    State(course_manager): State<GuardedCourseManager>,
    session: Session,
    Form(form): Form<EnrollmentForm>,
) -> Result<Response, CatalogError> {
    let course = course_manager.release(&session.caller, form.course_id()?)?;
    Ok((
        FlashMessages::success(format!("You left {}", course.name)),
        Redirect::to("/users/dashboard"),
    )
        .into_response())
}

async fn delete_course(
    State(course_manager): State<GuardedCourseManager>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response, CatalogError> {
    let course = course_manager.delete(&session.caller, &slug)?;
    Ok((
        FlashMessages::success(format!("{} has been removed successfully", course.name)),
        Redirect::to("/users/dashboard"),
    )
        .into_response())
}

async fn update_course(
    State(course_manager): State<GuardedCourseManager>,
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<CourseForm>,
) -> Result<Response, CatalogError> {
    let course = course_manager.update(&session.caller, &slug, &form)?;
    Ok((
        FlashMessages::success(format!("{} has been updated successfully", course.name)),
        Redirect::to("/users/dashboard"),
    )
        .into_response())
}

pub fn make_course_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/enroll", post(enroll))
        .route("/release", post(release))
        .route(
            "/{slug}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{slug}/delete", post(delete_course))
        .route("/{slug}/update", post(update_course))
        .with_state(state)
}
