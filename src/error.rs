//! Named error conditions raised while shaping or cleaning tables.
//!
//! Everything else in the crate reports through [`eyre::Report`]; these
//! variants convert into it with `?` and can be recovered by callers with
//! `report.downcast_ref::<CleaningError>()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleaningError {
    /// The row's country code has no entry in the dialing code table.
    #[error("unsupported country code '{country_code}' in row {row}: no dialing code configured")]
    UnsupportedCountry { row: usize, country_code: String },

    /// A card number still contains non-digit characters after sanitising.
    #[error("unresolved card number '{value}' in row {row}")]
    UnresolvedCardNumber { row: usize, value: String },

    /// A PDF page layout could not be reconciled with the first page's layout.
    #[error("page {page} does not match the expected columns [{expected}]: found [{found}]")]
    SchemaMismatch {
        page: usize,
        expected: String,
        found: String,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("unexpected column '{0}'")]
    UnexpectedColumn(String),

    /// A row did not have one cell per column.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}
