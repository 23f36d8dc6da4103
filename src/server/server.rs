use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

use super::auth_routes::make_auth_routes;
use super::course_routes::make_course_routes;
use super::pages::{render, Empty};
use super::session::RequestContext;
use super::{log_requests, state::*, ServerConfig};
use crate::catalog_store::FullCatalogStore;
use crate::course::CourseManager;
use crate::user::UserManager;

#[derive(Serialize)]
struct HomePage {
    uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>, ctx: RequestContext) -> Response {
    let page = HomePage {
        uptime: format_uptime(state.start_time.elapsed()),
    };
    render("index", &ctx, page)
}

async fn about(ctx: RequestContext) -> Response {
    render("about", &ctx, Empty {})
}

async fn login_page(ctx: RequestContext) -> Response {
    render("login", &ctx, Empty {})
}

async fn register_page(ctx: RequestContext) -> Response {
    render("register", &ctx, Empty {})
}

impl ServerState {
    fn new(config: ServerConfig, store: Arc<dyn FullCatalogStore>) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(UserManager::new(store.clone())),
            course_manager: Arc::new(CourseManager::new(store)),
        }
    }
}

pub fn make_app(config: ServerConfig, store: Arc<dyn FullCatalogStore>) -> Result<Router> {
    let state = ServerState::new(config.clone(), store);

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .with_state(state.clone())
        .nest("/users", make_auth_routes(state.clone()))
        .nest("/courses", make_course_routes(state.clone()));

    if let Some(public_dir_path) = config.public_dir_path {
        let static_files_service =
            ServeDir::new(public_dir_path).append_index_html_on_directories(true);
        app = app.fallback_service(static_files_service);
    }

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(store: Arc<dyn FullCatalogStore>, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
