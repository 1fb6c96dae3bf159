//! Storage Layer
//!
//! The document store and typed repositories over its collections.

pub mod database;
pub mod minutes;
pub mod projects;
pub mod tickets;

pub use database::*;
pub use minutes::*;
pub use projects::*;
pub use tickets::*;
