//! HTML surface: askama pages and htmx fragments.

pub mod forms;
pub mod handlers;
