//! PDF table extractor

use super::content::text_runs;
use super::layout::{parse_page_text, table_from_runs};
use crate::etl::Extractor;
use crate::frame::column_names;
use eyre::{Context, Result};
use lopdf::content::Content;
use lopdf::{Document, ObjectId};
use polars::prelude::DataFrame;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where a PDF document is read from
#[derive(Debug, Clone, PartialEq)]
pub enum PdfSource {
    Path(PathBuf),
    Url(Url),
}

impl PdfSource {
    /// Interpret `http://` and `https://` strings as URLs, anything else as a path.
    pub fn parse(path_or_url: &str) -> Self {
        match Url::parse(path_or_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
            _ => Self::Path(PathBuf::from(path_or_url)),
        }
    }
}

impl fmt::Display for PdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Extractor yielding one table per PDF page, in page order
///
/// Pages are not required to share a layout; reconciling them is the
/// card cleaner's job.
///
/// # Example
/// ```no_run
/// use retail_etl::etl::Extractor;
/// use retail_etl::pdf::PdfExtractor;
///
/// # async fn example() -> eyre::Result<()> {
/// let extractor = PdfExtractor::new("https://example.com/card_details.pdf");
/// let pages = extractor.extract().await?;
/// println!("{} page(s)", pages.len());
/// # Ok(())
/// # }
/// ```
pub struct PdfExtractor {
    source: PdfSource,
}

impl PdfExtractor {
    pub fn new(path_or_url: &str) -> Self {
        Self {
            source: PdfSource::parse(path_or_url),
        }
    }

    pub fn source(&self) -> &PdfSource {
        &self.source
    }

    async fn load_document(&self) -> Result<Document> {
        match &self.source {
            PdfSource::Path(path) => Document::load(path)
                .with_context(|| format!("Failed to open PDF: {}", path.display())),
            PdfSource::Url(url) => {
                log::debug!("Downloading PDF from {}", url);
                let response = reqwest::get(url.clone())
                    .await
                    .with_context(|| format!("Failed to download PDF: {}", url))?;

                if !response.status().is_success() {
                    eyre::bail!("Failed to download PDF ({}): {}", response.status(), url);
                }

                let bytes = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read PDF body: {}", url))?;
                log::debug!("Downloaded {} bytes", bytes.len());

                Document::load_mem(&bytes).with_context(|| format!("Failed to parse PDF: {}", url))
            }
        }
    }

    /// Read every table in the document, one per page
    pub async fn read_pdf_tables(&self) -> Result<Vec<DataFrame>> {
        let document = self.load_document().await?;
        let pages = document.get_pages();
        log::info!("Reading {} page(s) from {}", pages.len(), self.source);

        let mut tables = Vec::with_capacity(pages.len());
        for (page_number, page_id) in pages {
            match read_page(&document, page_number, page_id)
                .with_context(|| format!("Failed to parse table on page {}", page_number))?
            {
                Some(table) => {
                    log::debug!(
                        "Page {}: {} row(s), columns [{}]",
                        page_number,
                        table.height(),
                        column_names(&table).join(", ")
                    );
                    tables.push(table);
                }
                None => log::warn!("Page {} has no table, skipping", page_number),
            }
        }

        Ok(tables)
    }
}

/// Read one page's table from its positioned text, falling back to the
/// page's plain text when that splits into more columns.
fn read_page(document: &Document, page_number: u32, page_id: ObjectId) -> Result<Option<DataFrame>> {
    let runs = match document
        .get_page_content(page_id)
        .and_then(|bytes| Content::decode(&bytes))
    {
        Ok(content) => text_runs(&content),
        Err(e) => {
            log::debug!("Page {}: content stream unreadable: {}", page_number, e);
            Vec::new()
        }
    };
    let positioned = table_from_runs(&runs)?;

    let text = document.extract_text(&[page_number]).unwrap_or_else(|e| {
        log::debug!("Page {}: no plain text: {}", page_number, e);
        String::new()
    });
    let fallback = parse_page_text(&text)?;

    Ok(match (positioned, fallback) {
        (Some(positioned), Some(fallback)) if fallback.width() > positioned.width() => {
            log::debug!("Page {}: using plain text layout", page_number);
            Some(fallback)
        }
        (Some(positioned), _) => Some(positioned),
        (None, fallback) => fallback,
    })
}

impl Extractor for PdfExtractor {
    type Item = DataFrame;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        self.read_pdf_tables().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            PdfSource::parse("https://data.example.com/card_details.pdf"),
            PdfSource::Url(Url::parse("https://data.example.com/card_details.pdf").unwrap())
        );
        assert_eq!(
            PdfSource::parse("data/card_details.pdf"),
            PdfSource::Path(PathBuf::from("data/card_details.pdf"))
        );
        // Windows drive letters parse as URL schemes
        assert_eq!(
            PdfSource::parse("C:/data/cards.pdf"),
            PdfSource::Path(PathBuf::from("C:/data/cards.pdf"))
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let extractor = PdfExtractor::new("does/not/exist.pdf");
        let err = extractor.extract().await.unwrap_err();
        assert!(err.to_string().contains("Failed to open PDF"));
    }
}
