//! Bookclub Core - creative-coding bookclub backend
//!
//! Members publish small p5.js sketches under their own namespace. This
//! crate provides the REST API, the path-template router it is served
//! through, cookie sessions and the sketch slug rules.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod repository;
pub mod router;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
