pub mod config;
pub mod error;
mod http_layers;
pub mod metrics;
mod notification_routes;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http_layers::*;
pub use server::{make_app, run_server};
