//! HTTP route handlers.

pub mod editor;
pub mod health;
pub mod helpers;
pub mod preview;
pub mod workspace;
