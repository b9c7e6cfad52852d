//! Retail ETL
//!
//! Extracts retail data from a legacy database, a PDF of card details and a
//! store API, cleans it, and loads the results into a target database.

pub mod clean;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod etl;
pub mod frame;
pub mod pdf;
pub mod storage;
pub mod stores;

// Re-exports for convenience
pub use clean::{CardCleaner, MissingValueCleaner, SchemaReconciler, UserCleaner};
pub use client::{Auth, StoresClient};
pub use config::{CleaningConfig, DatabaseCredentials};
pub use database::{Database, DatabaseConnector, TableExtractor, TableLoader};
pub use error::CleaningError;
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use pdf::PdfExtractor;
pub use storage::NdjsonWriter;
pub use stores::StoresExtractor;
pub use polars::prelude::DataFrame;
