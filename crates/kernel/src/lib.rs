//! Maquette Kernel Library
//!
//! Block schema registry, template editor pipeline, rendering, and the HTTP
//! surface. The main entry point for running the server is the `maquette`
//! binary.

pub mod cache;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod models;
pub mod render;
pub mod routes;
pub mod schema;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{EditorError, EditorResult};
pub use state::AppState;
