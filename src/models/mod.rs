//! Data Models
//!
//! Configuration structures for the application crate. Domain records live
//! in `todo-tracker-core`.

pub mod settings;

pub use settings::*;
