//! Generic missing value normalisation

use crate::etl::Transformer;
use crate::frame::{NULL_TOKEN, drop_empty_rows, replace_sentinel};
use eyre::Result;
use polars::prelude::*;

/// Replaces a sentinel token with nulls and drops empty rows.
///
/// Used for sources that need no other cleaning, such as store details.
#[derive(Debug, Clone)]
pub struct MissingValueCleaner {
    token: String,
}

impl Default for MissingValueCleaner {
    fn default() -> Self {
        Self::new(NULL_TOKEN)
    }
}

impl MissingValueCleaner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Transformer for MissingValueCleaner {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, mut input: DataFrame) -> Result<DataFrame> {
        replace_sentinel(&mut input, &self.token)?;
        let cleaned = drop_empty_rows(&input)?;
        let dropped = input.height() - cleaned.height();
        if dropped > 0 {
            log::debug!("Dropped {} empty row(s)", dropped);
        }
        Ok(cleaned)
    }
}
