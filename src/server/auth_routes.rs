//! `/users` routes: registration, login, logout, dashboard and user removal.

use super::error::back_to;
use super::flash::FlashMessages;
use super::pages::render;
use super::session::{RequestContext, Session};
use super::state::{GuardedUserManager, ServerState};
use crate::error::CatalogError;
use crate::user::RegisterForm;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, error};

pub const REGISTER_FAILED: &str = "An error occurred while creating the user.";
pub const LOGIN_REQUIRED: &str = "Please log in to continue";

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn signup(
    State(user_manager): State<GuardedUserManager>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match user_manager.register(form) {
        Ok(user) => (
            FlashMessages::success(format!("Welcome {}, you can now log in", user.name)),
            Redirect::to("/login"),
        )
            .into_response(),
        Err(CatalogError::ValidationFailed(messages)) => back_to(
            StatusCode::BAD_REQUEST,
            "/register",
            FlashMessages::errors(messages),
        ),
        Err(err) => {
            error!("Failed to register user: {}", err);
            back_to(
                StatusCode::INTERNAL_SERVER_ERROR,
                "/register",
                FlashMessages::error(REGISTER_FAILED),
            )
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match user_manager.login(&form.email, &form.password) {
        Ok((user, token)) => {
            debug!("User {} logged in", user.id);
            (
                jar.add(Session::cookie(&token.value)),
                Redirect::to("/users/dashboard"),
            )
                .into_response()
        }
        Err(err @ (CatalogError::UserDoesNotExist | CatalogError::InvalidCredentials)) => back_to(
            StatusCode::BAD_REQUEST,
            "/login",
            FlashMessages::error(err.user_message()),
        ),
        Err(err) => err.into_response(),
    }
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Response {
    let jar = jar.add(Session::clearing_cookie());
    let Some(session) = ctx.session else {
        return (jar, Redirect::to("/")).into_response();
    };
    match user_manager.logout(&session.token) {
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err(err) => {
            error!("Failed to delete session of user {}: {}", session.user_id(), err);
            back_to(
                StatusCode::INTERNAL_SERVER_ERROR,
                "/",
                FlashMessages::error(err.user_message()),
            )
        }
    }
}

async fn dashboard(State(user_manager): State<GuardedUserManager>, ctx: RequestContext) -> Response {
    let Some(caller) = ctx.caller() else {
        return (FlashMessages::error(LOGIN_REQUIRED), Redirect::to("/login")).into_response();
    };
    match user_manager.dashboard(caller) {
        Ok(dashboard) => render("dashboard", &ctx, dashboard),
        Err(err) => err.into_response(),
    }
}

async fn delete_user(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, CatalogError> {
    let user_id = id
        .parse::<usize>()
        .map_err(|_| CatalogError::NotFound("user"))?;
    let deleted = user_manager.delete_user(&session.caller, user_id)?;
    let flash = FlashMessages::success(format!("{} has been removed successfully", deleted.name));
    if deleted.id == session.user_id() {
        // The session went away together with the user.
        return Ok((jar.add(Session::clearing_cookie()), flash, Redirect::to("/")).into_response());
    }
    Ok((flash, Redirect::to("/users/dashboard")).into_response())
}

pub fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout).post(logout))
        .route("/dashboard", get(dashboard))
        .route("/{id}", delete(delete_user))
        .route("/{id}/delete", post(delete_user))
        .with_state(state)
}
