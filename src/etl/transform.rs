//! Transformer trait for cleaning extracted data

use eyre::Result;

/// Transformer trait for transforming data items
///
/// Implementors define how to turn a raw item into a cleaned one:
/// - Missing value normalisation
/// - Type conversion (dates, integers)
/// - Value correction (country codes, phone numbers)
///
/// # Example
/// ```
/// use retail_etl::etl::Transformer;
/// use retail_etl::frame::{NULL_TOKEN, replace_sentinel};
/// use eyre::Result;
/// use polars::prelude::DataFrame;
///
/// struct SentinelReplacer;
///
/// impl Transformer for SentinelReplacer {
///     type Input = DataFrame;
///     type Output = DataFrame;
///
///     fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
///         replace_sentinel(&mut input, NULL_TOKEN)?;
///         Ok(input)
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails (missing columns, unresolved values, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items (default batch implementation)
    ///
    /// Override this when items must be combined, e.g. PDF pages merged into one table
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}
