// Presentation layer - HTTP rendering surface
pub mod annotation_handlers;
pub mod app_state;
pub mod handlers;
