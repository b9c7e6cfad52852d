//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Sources implement [`Extractor`], cleaners implement [`Transformer`] and
//! destinations implement [`Loader`]. A [`Pipeline`] runs the three in order.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::Transformer;
