//! Store details source

mod extractor;

pub use extractor::{StoresExtractor, assemble_store_records};
