//! Extractor trait for pulling raw tables out of a source

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define how to extract items from sources like:
/// - Database tables
/// - PDF documents (one table per page)
/// - Paginated HTTP APIs
///
/// # Example
/// ```no_run
/// use retail_etl::etl::Extractor;
/// use eyre::Result;
/// use polars::prelude::*;
///
/// struct StaticExtractor;
///
/// impl Extractor for StaticExtractor {
///     type Item = DataFrame;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(vec![df!("id" => [1i64])?])
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract items from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, database, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}
