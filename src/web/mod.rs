pub mod api;
pub mod api_doc;
pub mod auth;
pub mod config;
pub mod server;
pub mod state;
pub mod ui;
pub mod ws;

pub use config::Config;
pub use server::{build_tracker, run_server};
