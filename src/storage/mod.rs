//! File system output
//!
//! Cleaned tables can be written to NDJSON instead of a database, for
//! inspection or for loading elsewhere.

mod ndjson;

pub use ndjson::NdjsonWriter;
