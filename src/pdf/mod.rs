//! PDF document source
//!
//! Each page's content stream is decoded with `lopdf` into positioned text
//! runs ([`text_runs`]) and laid out into a table by [`table_from_runs`].
//! Pages whose content stream gives no usable layout are read from their plain
//! text by [`parse_page_text`].

mod content;
mod extractor;
mod layout;

pub use content::{TextRun, text_runs};
pub use extractor::{PdfExtractor, PdfSource};
pub use layout::{COLUMN_TOLERANCE, ROW_TOLERANCE, parse_page_text, split_cells, table_from_runs};
