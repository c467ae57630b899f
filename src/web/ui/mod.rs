pub mod handlers;
pub mod templates;
