//! Runtime layer for ASKUE ingestion.
//!
//! Owns the canonical dataset across batches and memoises file parses on
//! their content hash.

pub mod cache;
pub mod session;

pub use askue_core as core;
pub use askue_data as data;
pub use cache::ParseCache;
pub use session::{IngestOutcome, IngestSession};
