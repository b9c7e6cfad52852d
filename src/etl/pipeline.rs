//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use retail_etl::clean::UserCleaner;
/// use retail_etl::database::{DatabaseConnector, TableExtractor, TableLoader};
/// use retail_etl::etl::Pipeline;
///
/// # async fn example() -> eyre::Result<()> {
/// let source = DatabaseConnector::from_file("db_creds.yaml")?.connect().await?;
/// let target = DatabaseConnector::from_file("local_db_creds.yaml")?.connect().await?;
///
/// let pipeline = Pipeline::new(
///     TableExtractor::new(source, "legacy_users"),
///     UserCleaner::default(),
///     TableLoader::new(target, "dim_users"),
/// );
///
/// let rows = pipeline.run().await?;
/// println!("Loaded {} rows", rows);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract items from source
    /// 2. Transform the batch
    /// 3. Load items to destination
    ///
    /// Returns the number of rows written by the loader
    ///
    /// # Errors
    /// Returns an error if any stage fails
    pub async fn run(&self) -> Result<usize> {
        log::info!("Starting ETL pipeline");

        log::debug!("Extracting from source...");
        let items = self.extractor.extract().await?;
        log::info!("Extracted {} item(s)", items.len());

        if items.is_empty() {
            log::warn!("Nothing extracted, pipeline complete");
            return Ok(0);
        }

        log::debug!("Cleaning items...");
        let transformed = self.transformer.transform_many(items)?;
        log::info!("Cleaned {} item(s)", transformed.len());

        log::debug!("Loading to destination...");
        let count = self.loader.load(transformed).await?;
        log::info!("Loaded {} row(s)", count);

        Ok(count)
    }
}
