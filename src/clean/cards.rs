//! Card record cleaning
//!
//! Card details arrive as one table per PDF page. [`CardCleaner`] reconciles
//! the page layouts, concatenates them in page order and then cleans the
//! combined table.

use super::dates::{convert_expiry_column, convert_free_form_date_column};
use super::reconcile::{MergedColumnRule, SchemaReconciler};
use crate::error::CleaningError;
use crate::etl::Transformer;
use crate::frame::{
    NULL_TOKEN, concat, drop_empty_rows, replace_sentinel, require, set_categorical, text_values,
};
use eyre::Result;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

pub const CARD_NUMBER_COLUMN: &str = "card_number";
pub const EXPIRY_DATE_COLUMN: &str = "expiry_date";
pub const CARD_PROVIDER_COLUMN: &str = "card_provider";
pub const PAYMENT_DATE_COLUMN: &str = "date_payment_confirmed";

/// Providers that occur in the card details document, kept even when they
/// appear only once
pub const KNOWN_PROVIDERS: [&str; 10] = [
    "American Express",
    "Diners Club / Carte Blanche",
    "Discover",
    "JCB 15 digit",
    "JCB 16 digit",
    "Maestro",
    "Mastercard",
    "VISA 13 digit",
    "VISA 16 digit",
    "VISA 19 digit",
];

/// Drop rows whose provider occurs exactly once and is not a known provider.
///
/// Missing providers are not counted and their rows are kept.
pub fn filter_unique_providers(df: &DataFrame, known: &BTreeSet<String>) -> Result<DataFrame> {
    let providers = require(df, CARD_PROVIDER_COLUMN)?.cast(&DataType::String)?;
    let providers = providers.str()?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for provider in providers.into_iter().flatten() {
        *counts.entry(provider).or_default() += 1;
    }

    let keep: BooleanChunked = providers
        .into_iter()
        .map(|provider| match provider {
            Some(p) => counts[p] != 1 || known.contains(p),
            None => true,
        })
        .collect();

    let filtered = df.filter(&keep)?;
    let dropped = df.height() - filtered.height();
    if dropped > 0 {
        log::info!("Dropped {} row(s) with a one-off card provider", dropped);
    }
    Ok(filtered)
}

/// Parse a card number, stripping leading `?` and `-` noise first.
///
/// # Errors
/// [`CleaningError::UnresolvedCardNumber`] when the value is still not an
/// integer after stripping.
pub fn sanitize_card_number(row: usize, value: Option<&str>) -> Result<Option<i64>, CleaningError> {
    let Some(text) = value.map(str::trim) else {
        return Ok(None);
    };

    let digits = if text.chars().all(|c| c.is_ascii_digit()) {
        text
    } else {
        text.trim_start_matches(['?', '-'])
    };

    digits
        .parse::<i64>()
        .ok()
        .filter(|_| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .map(Some)
        .ok_or_else(|| CleaningError::UnresolvedCardNumber {
            row,
            value: text.to_string(),
        })
}

/// Convert `card_number` to a nullable `Int64` column.
pub fn clean_card_numbers(df: &mut DataFrame) -> Result<()> {
    let numbers = text_values(require(df, CARD_NUMBER_COLUMN)?)?
        .iter()
        .enumerate()
        .map(|(row, value)| sanitize_card_number(row, value.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    df.with_column(Series::new(CARD_NUMBER_COLUMN.into(), numbers))?;
    Ok(())
}

/// Cleans card details extracted from the PDF.
///
/// # Example
/// ```
/// use polars::prelude::*;
/// use retail_etl::clean::CardCleaner;
/// use retail_etl::etl::Transformer;
///
/// let page = df!(
///     "card_number" => ["?4971858637664481", "NULL"],
///     "expiry_date" => ["09/26", "NULL"],
///     "card_provider" => ["VISA 16 digit", "NULL"],
///     "date_payment_confirmed" => ["2015-11-25", "NULL"],
/// )?;
///
/// let cleaned = CardCleaner::default().transform(page)?;
/// assert_eq!(cleaned.height(), 1);
/// let numbers = cleaned.column("card_number")?.as_materialized_series();
/// assert_eq!(numbers.i64()?.get(0), Some(4971858637664481));
/// # Ok::<(), eyre::Report>(())
/// ```
#[derive(Debug, Clone)]
pub struct CardCleaner {
    reconciler: SchemaReconciler,
    known_providers: BTreeSet<String>,
}

impl Default for CardCleaner {
    fn default() -> Self {
        Self {
            reconciler: SchemaReconciler::new()
                .with_rule(MergedColumnRule::new(&[CARD_NUMBER_COLUMN, EXPIRY_DATE_COLUMN])),
            known_providers: KNOWN_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl CardCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of providers kept regardless of frequency
    pub fn with_known_providers<S: Into<String>>(
        mut self,
        providers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.known_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// Reconcile page layouts and stack pages in order
    pub fn merge_pages(&self, pages: Vec<DataFrame>) -> Result<DataFrame> {
        let pages = self.reconciler.reconcile(pages)?;
        log::debug!("Merging {} page(s)", pages.len());
        concat(pages)
    }

    fn clean(&self, mut cards: DataFrame) -> Result<DataFrame> {
        replace_sentinel(&mut cards, NULL_TOKEN)?;
        let rows = cards.height();
        let cards = drop_empty_rows(&cards)?;
        log::debug!("Dropped {} empty row(s)", rows - cards.height());

        let mut cards = filter_unique_providers(&cards, &self.known_providers)?;
        clean_card_numbers(&mut cards)?;
        set_categorical(&mut cards, CARD_PROVIDER_COLUMN)?;
        convert_expiry_column(&mut cards, EXPIRY_DATE_COLUMN)?;
        convert_free_form_date_column(&mut cards, PAYMENT_DATE_COLUMN)?;

        log::info!("Cleaned {} card record(s)", cards.height());
        Ok(cards)
    }
}

impl Transformer for CardCleaner {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, input: DataFrame) -> Result<DataFrame> {
        self.clean(input)
    }

    fn transform_many(&self, inputs: Vec<DataFrame>) -> Result<Vec<DataFrame>> {
        let merged = self.merge_pages(inputs)?;
        Ok(vec![self.clean(merged)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{column_names, date_values, int_values};
    use chrono::NaiveDate;

    const COLUMNS: [&str; 4] = [
        CARD_NUMBER_COLUMN,
        EXPIRY_DATE_COLUMN,
        CARD_PROVIDER_COLUMN,
        PAYMENT_DATE_COLUMN,
    ];

    fn providers_frame(providers: &[Option<&str>]) -> DataFrame {
        df!(CARD_PROVIDER_COLUMN => providers).unwrap()
    }

    fn providers(df: &DataFrame) -> Vec<Option<String>> {
        text_values(require(df, CARD_PROVIDER_COLUMN).unwrap()).unwrap()
    }

    fn texts(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_one_off_provider_dropped() {
        let known: BTreeSet<String> = ["AMEX".to_string()].into();
        let df = providers_frame(&[Some("VISA"), Some("VISA"), Some("AMEX"), Some("ONEOFF")]);

        let filtered = filter_unique_providers(&df, &known).unwrap();
        assert_eq!(filtered.height(), 3);
        assert_eq!(providers(&filtered), texts(&["VISA", "VISA", "AMEX"]));
    }

    #[test]
    fn test_unknown_single_providers_dropped_without_allowlist() {
        let df = providers_frame(&[Some("VISA"), Some("VISA"), Some("AMEX"), Some("ONEOFF")]);
        let filtered = filter_unique_providers(&df, &BTreeSet::new()).unwrap();
        assert_eq!(providers(&filtered), texts(&["VISA", "VISA"]));
    }

    #[test]
    fn test_default_allowlist_holds_document_providers_only() {
        let cleaner = CardCleaner::default();
        assert_eq!(cleaner.known_providers.len(), 10);
        assert!(cleaner.known_providers.contains("Diners Club / Carte Blanche"));
        assert!(!cleaner.known_providers.contains("AMEX"));

        let with_amex = CardCleaner::default().with_known_providers(["AMEX"]);
        let df = providers_frame(&[Some("VISA"), Some("VISA"), Some("AMEX"), Some("ONEOFF")]);
        let filtered = filter_unique_providers(&df, &with_amex.known_providers).unwrap();
        assert_eq!(providers(&filtered), texts(&["VISA", "VISA", "AMEX"]));
    }

    #[test]
    fn test_missing_provider_kept() {
        let df = providers_frame(&[None, Some("Maestro")]);
        let filtered = filter_unique_providers(&df, &BTreeSet::new()).unwrap();
        assert_eq!(providers(&filtered), vec![None]);
    }

    #[test]
    fn test_sanitize_card_number() {
        let clean = |s: &str| sanitize_card_number(0, Some(s));
        assert_eq!(clean("4971858637664481").unwrap(), Some(4971858637664481));
        assert_eq!(clean("??4971858637664481").unwrap(), Some(4971858637664481));
        assert_eq!(clean("-?30060773296197").unwrap(), Some(30060773296197));
        assert_eq!(sanitize_card_number(0, None).unwrap(), None);
    }

    #[test]
    fn test_unresolved_card_number() {
        let err = sanitize_card_number(4, Some("NB71VBAHJE")).unwrap_err();
        assert_eq!(
            err,
            CleaningError::UnresolvedCardNumber {
                row: 4,
                value: "NB71VBAHJE".to_string()
            }
        );
        assert!(sanitize_card_number(0, Some("??")).is_err());
        assert!(sanitize_card_number(0, Some("4000-1234")).is_err());
    }

    #[test]
    fn test_transform_many_merges_and_cleans() {
        let first = df!(
            CARD_NUMBER_COLUMN => ["4971858637664481", "NULL", "?3554954842403828"],
            EXPIRY_DATE_COLUMN => ["09/26", "NULL", "02/24"],
            CARD_PROVIDER_COLUMN => ["VISA 16 digit", "NULL", "JCB 16 digit"],
            PAYMENT_DATE_COLUMN => ["2015-11-25", "NULL", "September 2016 04"],
        )
        .unwrap();
        let second = df!(
            "card_number expiry_date" => ["4000123412341234 04/26", "1234 01/25"],
            CARD_PROVIDER_COLUMN => ["VISA 16 digit", "TYPO"],
            PAYMENT_DATE_COLUMN => ["2019-05-12", "2019-05-12"],
        )
        .unwrap();

        let mut out = CardCleaner::new().transform_many(vec![first, second]).unwrap();
        assert_eq!(out.len(), 1);
        let cards = out.remove(0);

        assert_eq!(column_names(&cards), COLUMNS.to_vec());
        assert_eq!(cards.height(), 3);
        assert_eq!(
            int_values(require(&cards, CARD_NUMBER_COLUMN).unwrap()).unwrap(),
            vec![
                Some(4971858637664481),
                Some(3554954842403828),
                Some(4000123412341234)
            ]
        );

        let expiry = require(&cards, EXPIRY_DATE_COLUMN).unwrap();
        assert_eq!(expiry.dtype(), &DataType::Date);
        assert_eq!(
            date_values(expiry).unwrap()[2],
            NaiveDate::from_ymd_opt(2026, 4, 30)
        );
        assert_eq!(
            date_values(require(&cards, PAYMENT_DATE_COLUMN).unwrap()).unwrap()[1],
            NaiveDate::from_ymd_opt(2016, 9, 4)
        );
        assert!(matches!(
            require(&cards, CARD_PROVIDER_COLUMN).unwrap().dtype(),
            DataType::Categorical(..)
        ));
    }

    #[test]
    fn test_unresolved_number_surfaces_through_transform() {
        let page = df!(
            CARD_NUMBER_COLUMN => ["GB9RPLGQ1K", "4971858637664481"],
            EXPIRY_DATE_COLUMN => ["09/26", "09/26"],
            CARD_PROVIDER_COLUMN => ["VISA 16 digit", "VISA 16 digit"],
            PAYMENT_DATE_COLUMN => ["2015-11-25", "2015-11-25"],
        )
        .unwrap();

        let err = CardCleaner::new().transform(page).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CleaningError>(),
            Some(CleaningError::UnresolvedCardNumber { row: 0, .. })
        ));
    }
}
