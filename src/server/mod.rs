pub mod config;
mod auth_routes;
mod course_routes;
mod error;
pub mod flash;
mod http_layers;
mod pages;
pub mod server;
pub(self) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
