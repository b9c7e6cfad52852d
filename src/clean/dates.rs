//! Date parsing for free-text date columns
//!
//! Unparseable values become null; callers decide whether a missing date
//! makes the row unusable.

use crate::frame::{date_series, require, text_values};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};
use eyre::Result;
use polars::prelude::*;

/// Formats found in the user table, tried in order
pub const KNOWN_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y %B %d", "%B %Y %d"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Date-only formats accepted by [`parse_free_form_date`], tried in order
const FREE_FORM_DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y %B %d",
    "%B %Y %d",
    "%d %B %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

const FREE_FORM_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

fn has_full_month_name(text: &str) -> bool {
    text.split(' ').any(|word| MONTH_NAMES.contains(&word))
}

/// Parse a date in one of the [`KNOWN_DATE_FORMATS`].
///
/// The first format matching the whole string wins. Surrounding whitespace
/// and abbreviated month names (`Jan`) do not match.
pub fn parse_known_date(text: &str) -> Option<NaiveDate> {
    if text.trim() != text {
        return None;
    }
    KNOWN_DATE_FORMATS
        .iter()
        .filter(|format| !format.contains("%B") || has_full_month_name(text))
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Parse a date written in any of the common layouts.
///
/// Slash dates are read month first. Times are discarded.
pub fn parse_free_form_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    FREE_FORM_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            FREE_FORM_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|ts| ts.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|ts| ts.date_naive()))
}

/// Parse an `MM/YY` expiry date as the last calendar day of that month.
pub fn parse_expiry_date(text: &str) -> Option<NaiveDate> {
    let first = NaiveDate::parse_from_str(&format!("01/{}", text.trim()), "%d/%m/%y").ok()?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

fn convert_with(
    df: &mut DataFrame,
    name: &str,
    parse: impl Fn(&str) -> Option<NaiveDate>,
) -> Result<()> {
    let series = require(df, name)?;
    let dates = match series.dtype() {
        DataType::Date => return Ok(()),
        DataType::Datetime(..) => series.cast(&DataType::Date)?,
        _ => {
            let parsed = text_values(series)?
                .into_iter()
                .map(|value| value.as_deref().and_then(&parse))
                .collect();
            date_series(name, parsed)?
        }
    };
    df.with_column(dates)?;
    Ok(())
}

/// Convert a column using [`parse_known_date`].
pub fn convert_date_column(df: &mut DataFrame, name: &str) -> Result<()> {
    convert_with(df, name, parse_known_date)
}

/// Convert a column using [`parse_free_form_date`].
pub fn convert_free_form_date_column(df: &mut DataFrame, name: &str) -> Result<()> {
    convert_with(df, name, parse_free_form_date)
}

/// Convert an `MM/YY` column to month-end dates.
pub fn convert_expiry_column(df: &mut DataFrame, name: &str) -> Result<()> {
    convert_with(df, name, parse_expiry_date)
}
