//! Database table extractor

use super::Database;
use crate::etl::Extractor;
use eyre::Result;
use polars::prelude::DataFrame;

/// Extractor for a single database table
///
/// Yields exactly one [`DataFrame`] holding every row of the source table.
pub struct TableExtractor {
    database: Database,
    table_name: String,
}

impl TableExtractor {
    /// # Arguments
    /// * `database` - Open source connection
    /// * `table_name` - Table to read, optionally schema-qualified
    pub fn new(database: Database, table_name: impl Into<String>) -> Self {
        Self {
            database,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl Extractor for TableExtractor {
    type Item = DataFrame;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        log::debug!("Reading table '{}'", self.table_name);
        let df = self.database.read_table(&self.table_name).await?;
        Ok(vec![df])
    }
}
