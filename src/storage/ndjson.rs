//! NDJSON (Newline Delimited JSON) output

use crate::etl::Loader;
use crate::frame::concat;

use eyre::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Write cleaned frames to a file, one JSON object per row
///
/// Dates are written as `YYYY-MM-DD` strings, categoricals as their text and
/// nulls as `null`.
pub struct NdjsonWriter {
    path: PathBuf,
}

impl NdjsonWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a frame's rows, replacing the file
    pub fn write(&self, df: &DataFrame) -> Result<()> {
        let mut out = df.clone();
        for column in df.get_columns() {
            if matches!(
                column.dtype(),
                DataType::Date | DataType::Datetime(..) | DataType::Categorical(..)
            ) {
                out.with_column(column.as_materialized_series().cast(&DataType::String)?)?;
            }
        }

        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create NDJSON file: {}", self.path.display()))?;
        if out.height() == 0 {
            return Ok(());
        }

        JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::JsonLines)
            .finish(&mut out)
            .with_context(|| format!("Failed to write NDJSON file: {}", self.path.display()))?;

        Ok(())
    }
}

impl Loader for NdjsonWriter {
    type Item = DataFrame;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        let df = concat(items)?;
        self.write(&df)?;
        log::info!("Wrote {} row(s) to {}", df.height(), self.path.display());
        Ok(df.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{date_series, set_categorical};
    use chrono::NaiveDate;
    use serde_json::{Value as Json, json};
    use tempfile::NamedTempFile;

    fn read_rows(path: &Path) -> Vec<Json> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_write_rows() {
        let temp = NamedTempFile::new().unwrap();
        let writer = NdjsonWriter::new(temp.path());

        let expiry = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        let mut df = df!(
            "card_number" => [4000123412341234i64, 30000000000004],
            "card_provider" => ["VISA 16 digit", "Maestro"],
        )
        .unwrap();
        df.with_column(date_series("expiry_date", vec![Some(expiry), None]).unwrap())
            .unwrap();
        set_categorical(&mut df, "card_provider").unwrap();
        writer.write(&df).unwrap();

        let rows = read_rows(temp.path());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            json!({
                "card_number": 4000123412341234i64,
                "card_provider": "VISA 16 digit",
                "expiry_date": "2026-04-30"
            })
        );
        assert_eq!(rows[1]["expiry_date"], Json::Null);
    }

    #[tokio::test]
    async fn test_load_concatenates() {
        let temp = NamedTempFile::new().unwrap();
        let writer = NdjsonWriter::new(temp.path());

        let page = |n: i64| df!("n" => [n]).unwrap();
        let count = writer.load(vec![page(1), page(2)]).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(read_rows(temp.path()), vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_load_empty() {
        let temp = NamedTempFile::new().unwrap();
        let writer = NdjsonWriter::new(temp.path());

        let count = writer.load(vec![]).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(std::fs::read_to_string(temp.path()).unwrap(), "");
    }
}
