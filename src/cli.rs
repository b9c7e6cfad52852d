//! CLI helper functions

use crate::{
    clean::{CardCleaner, MissingValueCleaner, UserCleaner},
    client::{Auth, StoresClient},
    config::CleaningConfig,
    database::{DatabaseConnector, TableExtractor, TableLoader},
    etl::{Extractor, Pipeline, Transformer},
    frame::{concat, info},
    pdf::PdfExtractor,
    storage::NdjsonWriter,
    stores::StoresExtractor,
};
use eyre::{Context, Result};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use url::Url;

/// Default output table for cleaned users
pub const USERS_TABLE: &str = "dim_users";
/// Default output table for cleaned card details
pub const CARDS_TABLE: &str = "dim_card_details";
/// Default output table for store details
pub const STORES_TABLE: &str = "dim_store_details";

/// Rows shown when previewing a cleaned table
const PREVIEW_ROWS: usize = 10;

/// Where a cleaned table ends up
#[derive(Debug, Clone)]
pub enum Destination {
    /// Replace a table in the database described by a credentials file
    Database { credentials: PathBuf, name: String },
    /// Write one JSON object per row
    Ndjson(PathBuf),
    /// Print a preview and summary without writing anything
    Preview,
}

/// Load the lookup tables, falling back to the built-in defaults
pub fn load_cleaning_config(mappings: Option<&Path>) -> Result<CleaningConfig> {
    match mappings {
        Some(path) => {
            log::info!("Reading mappings from {}", path.display());
            CleaningConfig::read(path)
        }
        None => Ok(CleaningConfig::default()),
    }
}

/// Load the store API client from environment variables
///
/// Expected environment variables:
/// - STORES_API_URL: Base URL of the store details API (required)
/// - STORES_API_KEY: Value for the `x-api-key` header (optional)
pub fn load_stores_client() -> Result<StoresClient> {
    let url_str =
        std::env::var("STORES_API_URL").context("STORES_API_URL environment variable not set")?;
    let url =
        Url::parse(&url_str).with_context(|| format!("Invalid STORES_API_URL: {}", url_str))?;

    let auth = Auth::from_apikey(std::env::var("STORES_API_KEY").ok());
    log::debug!("Store API auth: {}", auth);

    StoresClient::try_new(url, auth).context("Failed to create stores client")
}

/// Extract, clean, and deliver users from a source database table
///
/// Pipeline: TableExtractor → UserCleaner → destination
pub async fn run_users(
    source: impl AsRef<Path>,
    table_name: &str,
    config: CleaningConfig,
    destination: Destination,
) -> Result<usize> {
    let source = DatabaseConnector::from_file(source)?.connect().await?;
    let extractor = TableExtractor::new(source, table_name);
    deliver(extractor, UserCleaner::new(config), destination).await
}

/// Extract, clean, and deliver card details from a PDF file or URL
///
/// Pipeline: PdfExtractor → CardCleaner → destination
pub async fn run_cards(pdf: &str, destination: Destination) -> Result<usize> {
    let extractor = PdfExtractor::new(pdf);
    deliver(extractor, CardCleaner::new(), destination).await
}

/// Extract and deliver store details from the store API
///
/// Pipeline: StoresExtractor → MissingValueCleaner → destination
pub async fn run_stores(destination: Destination) -> Result<usize> {
    let client = load_stores_client()?;
    let extractor = StoresExtractor::new(client);
    deliver(extractor, MissingValueCleaner::default(), destination).await
}

/// Names of the tables in a database
pub async fn list_tables(source: impl AsRef<Path>) -> Result<Vec<String>> {
    let database = DatabaseConnector::from_file(source)?.connect().await?;
    database.list_tables().await
}

async fn deliver<E, T>(extractor: E, transformer: T, destination: Destination) -> Result<usize>
where
    E: Extractor,
    T: Transformer<Input = E::Item, Output = DataFrame>,
{
    match destination {
        Destination::Database { credentials, name } => {
            let target = DatabaseConnector::from_file(&credentials)?.connect().await?;
            Pipeline::new(extractor, transformer, TableLoader::new(target, name))
                .run()
                .await
        }
        Destination::Ndjson(path) => {
            Pipeline::new(extractor, transformer, NdjsonWriter::new(path))
                .run()
                .await
        }
        Destination::Preview => {
            let items = extractor.extract().await?;
            let df = concat(transformer.transform_many(items)?)?;
            print_preview(&df);
            Ok(df.height())
        }
    }
}

/// Render the first rows and a column summary of a table
pub fn preview(df: &DataFrame) -> String {
    format!(
        "Cleaned data:\n\n{}\n{}",
        df.head(Some(PREVIEW_ROWS)),
        info(df)
    )
}

fn print_preview(df: &DataFrame) {
    println!("{}", preview(df));
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    #[serial_test::serial]
    fn test_load_stores_client_no_url() {
        unsafe {
            std::env::remove_var("STORES_API_URL");
            std::env::remove_var("STORES_API_KEY");
        }

        let result = load_stores_client();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("STORES_API_URL"));
    }

    #[test]
    #[serial_test::serial]
    fn test_load_stores_client_with_url() {
        unsafe {
            std::env::set_var("STORES_API_URL", "https://api.example.com/prod");
            std::env::set_var("STORES_API_KEY", "secret");
        }

        let client = load_stores_client().unwrap();
        assert_eq!(client.url().as_str(), "https://api.example.com/prod/");

        unsafe {
            std::env::remove_var("STORES_API_URL");
            std::env::remove_var("STORES_API_KEY");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_load_stores_client_invalid_url() {
        unsafe {
            std::env::set_var("STORES_API_URL", "not-a-valid-url");
        }

        let result = load_stores_client();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid STORES_API_URL")
        );

        unsafe {
            std::env::remove_var("STORES_API_URL");
        }
    }

    #[test]
    fn test_default_cleaning_config() {
        let config = load_cleaning_config(None).unwrap();
        assert_eq!(config, CleaningConfig::default());
        assert!(load_cleaning_config(Some(Path::new("/nonexistent/mappings.yml"))).is_err());
    }

    #[test]
    fn test_preview() {
        let df = df!("store_code" => ["WEB-1388012W"]).unwrap();
        let text = preview(&df);
        assert!(text.starts_with("Cleaned data:"));
        assert!(text.contains("WEB-1388012W"));
        assert!(text.contains("store_code"));
    }
}
