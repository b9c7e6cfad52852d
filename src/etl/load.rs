//! Loader trait for writing cleaned data to a destination

use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Implementors define how to load items to destinations:
/// - Database tables (replaced wholesale)
/// - NDJSON files
///
/// # Example
/// ```no_run
/// use retail_etl::etl::Loader;
/// use eyre::Result;
/// use polars::prelude::DataFrame;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     type Item = DataFrame;
///
///     async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
///         Ok(items.iter().map(DataFrame::height).sum())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The type of items to load
    type Item: Send;

    /// Load items to the destination
    ///
    /// Returns the number of rows written
    ///
    /// # Errors
    /// Returns an error if loading fails (network, I/O, etc.)
    fn load(
        &self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
