//! Database table loader

use super::Database;
use crate::etl::Loader;
use crate::frame::concat;
use eyre::Result;
use polars::prelude::DataFrame;

/// Loader that replaces a named table in the target database
///
/// Several input frames are stacked into one before writing, so the
/// destination always ends up holding exactly the loaded rows.
pub struct TableLoader {
    database: Database,
    name: String,
}

impl TableLoader {
    pub fn new(database: Database, name: impl Into<String>) -> Self {
        Self {
            database,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Loader for TableLoader {
    type Item = DataFrame;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        let df = concat(items)?;
        log::info!("Replacing table '{}' with {} row(s)", self.name, df.height());
        self.database.write_table(&df, &self.name).await
    }
}
