//! Domain models for the bookclub backend

pub mod member;
pub mod session;
pub mod sketch;

pub use member::*;
pub use session::*;
pub use sketch::*;
