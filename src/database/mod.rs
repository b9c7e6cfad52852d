//! PostgreSQL source and destination
//!
//! [`TableExtractor`] reads a whole table, [`TableLoader`] replaces one.

mod connector;
mod extractor;
mod loader;
pub mod sql;

pub use connector::{Database, DatabaseConnector};
pub use extractor::TableExtractor;
pub use loader::TableLoader;
