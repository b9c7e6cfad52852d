//! Country code correction

use crate::config::CountryCodes;
use crate::frame::{require, text_values};
use eyre::Result;
use polars::prelude::*;

const COUNTRY_COLUMN: &str = "country";
const COUNTRY_CODE_COLUMN: &str = "country_code";

/// The code a record should carry, or `None` when it needs no change.
///
/// Countries missing from the map are never examined.
pub fn corrected_country_code<'a>(
    country: Option<&str>,
    country_code: Option<&str>,
    country_codes: &'a CountryCodes,
) -> Option<&'a str> {
    let expected = country_codes.code_for(country?)?;
    (country_code != Some(expected)).then_some(expected)
}

/// Overwrite `country_code` wherever it disagrees with `country`.
///
/// Returns the number of corrected rows.
pub fn correct_country_code(df: &mut DataFrame, country_codes: &CountryCodes) -> Result<usize> {
    let countries = text_values(require(df, COUNTRY_COLUMN)?)?;
    let mut codes = text_values(require(df, COUNTRY_CODE_COLUMN)?)?;

    let mut corrected = 0;
    for (country, code) in countries.iter().zip(codes.iter_mut()) {
        if let Some(expected) =
            corrected_country_code(country.as_deref(), code.as_deref(), country_codes)
        {
            *code = Some(expected.to_string());
            corrected += 1;
        }
    }

    df.with_column(Series::new(COUNTRY_CODE_COLUMN.into(), codes))?;
    if corrected > 0 {
        log::debug!("Corrected {} country code(s)", corrected);
    }
    Ok(corrected)
}
