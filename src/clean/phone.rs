//! Phone number normalisation
//!
//! Target format is the international number without a `+`: dialing code
//! followed by the national number with its trunk zeros removed, e.g.
//! `+44 (0)7911 123456` becomes `447911123456`. Extensions (`x123`) are
//! split into their own column.

use crate::config::DialingCodes;
use crate::error::CleaningError;
use crate::frame::{int_values, require, text_values};
use eyre::Result;
use polars::prelude::*;

pub const PHONE_COLUMN: &str = "phone_number";
pub const EXTENSION_COLUMN: &str = "phone_extension";
const COUNTRY_CODE_COLUMN: &str = "country_code";

/// A normalised phone number and optional extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhoneNumber {
    pub number: Option<i64>,
    pub extension: Option<i64>,
}

/// Split `raw` at the first literal `x` into number and extension.
pub fn split_extension(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('x') {
        Some((number, extension)) => (number, Some(extension)),
        None => (raw, None),
    }
}

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Ensure `digits` starts with exactly one `dialing_code`.
///
/// If the code is already present it is removed together with any trunk
/// zeros after it before being put back.
pub fn check_dialling_code(digits: &str, dialing_code: &str) -> String {
    let national = match digits.strip_prefix(dialing_code) {
        Some(rest) => rest.trim_start_matches('0'),
        None => digits,
    };
    format!("{}{}", dialing_code, national)
}

/// Normalise one record's phone number.
///
/// Pure over its inputs: applying it to its own output yields the same
/// number.
///
/// # Errors
/// [`CleaningError::UnsupportedCountry`] when the number is present but the
/// country code has no dialing code.
pub fn normalize_phone_number(
    row: usize,
    raw: Option<&str>,
    country_code: Option<&str>,
    dialing_codes: &DialingCodes,
) -> Result<PhoneNumber, CleaningError> {
    let Some(raw) = raw else {
        return Ok(PhoneNumber::default());
    };

    let (number, extension) = split_extension(raw);
    let extension = extension.map(digits).and_then(|e| e.parse::<i64>().ok());

    let national = digits(&number.replace("(0)", ""));
    let national = national.trim_start_matches('0');
    if national.is_empty() {
        return Ok(PhoneNumber {
            number: None,
            extension,
        });
    }

    let country_code = country_code.unwrap_or_default();
    let dialing_code =
        dialing_codes
            .code_for(country_code)
            .ok_or_else(|| CleaningError::UnsupportedCountry {
                row,
                country_code: country_code.to_string(),
            })?;

    let international = check_dialling_code(national, dialing_code);
    let number = international.parse::<i64>().ok();
    if number.is_none() {
        log::warn!("Row {}: phone number '{}' is too long, dropping it", row, raw);
    }

    Ok(PhoneNumber { number, extension })
}

/// Normalise the `phone_number` column and add a `phone_extension` column.
///
/// Both become nullable `Int64`. An existing extension is kept when the
/// number carries none, so running this twice changes nothing.
pub fn clean_phone_numbers(df: &mut DataFrame, dialing_codes: &DialingCodes) -> Result<()> {
    let phones = text_values(require(df, PHONE_COLUMN)?)?;
    let countries = text_values(require(df, COUNTRY_CODE_COLUMN)?)?;
    let existing = match df.column(EXTENSION_COLUMN) {
        Ok(column) => Some(int_values(column.as_materialized_series())?),
        Err(_) => None,
    };

    let mut numbers: Vec<Option<i64>> = Vec::with_capacity(phones.len());
    let mut extensions: Vec<Option<i64>> = Vec::with_capacity(phones.len());
    for (row, (phone, country)) in phones.iter().zip(&countries).enumerate() {
        let normalized =
            normalize_phone_number(row, phone.as_deref(), country.as_deref(), dialing_codes)?;

        numbers.push(normalized.number);
        extensions.push(
            normalized
                .extension
                .or_else(|| existing.as_ref().and_then(|values| values[row])),
        );
    }

    df.with_column(Series::new(PHONE_COLUMN.into(), numbers))?;
    df.with_column(Series::new(EXTENSION_COLUMN.into(), extensions))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str, country: &str) -> Result<PhoneNumber, CleaningError> {
        normalize_phone_number(0, Some(raw), Some(country), &DialingCodes::default())
    }

    fn number(raw: &str, country: &str) -> Option<i64> {
        normalize(raw, country).unwrap().number
    }

    #[test]
    fn test_adds_missing_dialing_code() {
        assert_eq!(number("07911 123456", "GB"), Some(447911123456));
        assert_eq!(number("030 901820", "DE"), Some(4930901820));
        assert_eq!(number("(555) 123-4567", "US"), Some(15551234567));
    }

    #[test]
    fn test_strips_trunk_zero_after_code() {
        assert_eq!(number("+44 (0)7911 123456", "GB"), Some(447911123456));
        assert_eq!(number("+49(0)30 901820", "DE"), Some(4930901820));
        assert_eq!(number("0044 07911 123456", "GB"), Some(447911123456));
        assert_eq!(number("001-555-123-4567", "US"), Some(15551234567));
    }

    #[test]
    fn test_idempotent() {
        let once = number("447911123456", "GB").unwrap();
        assert_eq!(once, 447911123456);
        let twice = number(&once.to_string(), "GB").unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_extension_split() {
        let phone = normalize("(212) 555-0123x4567", "US").unwrap();
        assert_eq!(phone.number, Some(12125550123));
        assert_eq!(phone.extension, Some(4567));
    }

    #[test]
    fn test_unsupported_country() {
        let err = normalize("+33 1 23 45 67 89", "FR").unwrap_err();
        assert_eq!(
            err,
            CleaningError::UnsupportedCountry {
                row: 0,
                country_code: "FR".to_string()
            }
        );
    }

    #[test]
    fn test_missing_phone_needs_no_country() {
        let phone = normalize_phone_number(3, None, Some("FR"), &DialingCodes::default()).unwrap();
        assert_eq!(phone, PhoneNumber::default());
    }

    #[test]
    fn test_clean_phone_numbers_twice() {
        let mut df = df!(
            "country_code" => ["GB", "US", "DE"],
            "phone_number" => [Some("+44(0)20 7946 0958 x12"), Some("555.201.3344"), None],
        )
        .unwrap();

        let codes = DialingCodes::default();
        clean_phone_numbers(&mut df, &codes).unwrap();
        let first = df.clone();
        clean_phone_numbers(&mut df, &codes).unwrap();
        assert!(df.equals_missing(&first));

        let phones = require(&df, PHONE_COLUMN).unwrap();
        assert_eq!(phones.dtype(), &DataType::Int64);
        assert_eq!(
            int_values(phones).unwrap(),
            vec![Some(442079460958), Some(15552013344), None]
        );
        assert_eq!(
            int_values(require(&df, EXTENSION_COLUMN).unwrap()).unwrap(),
            vec![Some(12), None, None]
        );
    }

    #[test]
    fn test_unsupported_country_in_frame() {
        let mut df = df!(
            "country_code" => ["GB", "FR"],
            "phone_number" => ["07911 123456", "+33 1 23 45 67 89"],
        )
        .unwrap();

        let err = clean_phone_numbers(&mut df, &DialingCodes::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CleaningError>(),
            Some(&CleaningError::UnsupportedCountry {
                row: 1,
                country_code: "FR".to_string()
            })
        );
    }
}
