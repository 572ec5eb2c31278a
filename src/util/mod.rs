//! Shared utilities

pub mod config;
pub mod diagnostic;

pub use config::{GenConfig, AUTOMATIC_AREA_NAME};
pub use diagnostic::Diagnostic;
