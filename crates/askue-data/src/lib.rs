//! Data layer for ASKUE 30917 meter logs.
//!
//! Decodes raw files, resolves header dates, tokenizes and expands data lines
//! into half-hour readings, merges them into the canonical [`Dataset`] and
//! computes summaries and anomaly scores over views of it. Also discovers
//! input files on disk and reads/writes the CSV form of the dataset.

pub mod anomaly;
pub mod dataset;
pub mod decoder;
pub mod expander;
pub mod export;
pub mod header;
pub mod parser;
pub mod reader;
pub mod summary;
pub mod tokenizer;

pub use askue_core as core;
pub use dataset::{Dataset, DatasetFilter};
pub use parser::{parse_batch, parse_file, ParsedBatch, ParserConfig};
