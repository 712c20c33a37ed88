//! Domain types, errors, settings and statistics helpers shared by the
//! ASKUE ingestion crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;

pub use error::{AskueError, Result};
