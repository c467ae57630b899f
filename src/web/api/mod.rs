pub mod airports;
pub mod error;
pub mod feed;
pub mod markers;
pub mod trails;
