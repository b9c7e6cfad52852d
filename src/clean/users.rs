//! User record cleaning

use super::country::correct_country_code;
use super::dates::convert_date_column;
use super::phone::clean_phone_numbers;
use super::text::{clean_email_addresses, fix_address_case};
use crate::config::CleaningConfig;
use crate::etl::Transformer;
use crate::frame::{
    NULL_TOKEN, drop_empty_rows, drop_missing_in, has_column, replace_sentinel, set_categorical,
};
use eyre::Result;
use polars::prelude::*;

const DATE_COLUMNS: [&str; 2] = ["date_of_birth", "join_date"];
const CATEGORICAL_COLUMNS: [&str; 2] = ["country", "country_code"];
const EMAIL_COLUMN: &str = "email_address";
const ADDRESS_COLUMN: &str = "address";
const INDEX_COLUMN: &str = "index";

/// Cleans the legacy user table.
///
/// Steps run in a fixed order; dates are parsed before rows with bad dates are
/// dropped, and country codes are corrected before phone numbers are
/// normalised against them.
///
/// # Example
/// ```
/// use polars::prelude::*;
/// use retail_etl::clean::UserCleaner;
/// use retail_etl::etl::Transformer;
///
/// let users = df!(
///     "date_of_birth" => ["1968 October 16"],
///     "join_date" => ["2018-12-23"],
///     "country" => ["Germany"],
///     "country_code" => ["DE"],
///     "email_address" => ["ida@@example.de"],
///     "phone_number" => ["+49(0)30 901820"],
///     "address" => ["zimmerstr. 1"],
/// )?;
///
/// let cleaned = UserCleaner::default().transform(users)?;
/// let phones = cleaned.column("phone_number")?.as_materialized_series();
/// assert_eq!(phones.i64()?.get(0), Some(4930901820));
/// # Ok::<(), eyre::Report>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct UserCleaner {
    config: CleaningConfig,
}

impl UserCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }
}

impl Transformer for UserCleaner {
    type Input = DataFrame;
    type Output = DataFrame;

    fn transform(&self, mut users: DataFrame) -> Result<DataFrame> {
        let rows = users.height();

        replace_sentinel(&mut users, NULL_TOKEN)?;
        let mut users = drop_empty_rows(&users)?;
        let empty = rows - users.height();

        for name in DATE_COLUMNS {
            convert_date_column(&mut users, name)?;
        }
        let dated = users.height();
        let mut users = drop_missing_in(&users, &DATE_COLUMNS)?;
        log::debug!(
            "Dropped {} empty row(s) and {} row(s) with unparseable dates",
            empty,
            dated - users.height()
        );

        correct_country_code(&mut users, &self.config.country_codes)?;
        clean_email_addresses(&mut users, EMAIL_COLUMN)?;
        clean_phone_numbers(&mut users, &self.config.dialing_codes)?;
        fix_address_case(&mut users, ADDRESS_COLUMN)?;

        for name in CATEGORICAL_COLUMNS {
            set_categorical(&mut users, name)?;
        }

        if has_column(&users, INDEX_COLUMN) {
            users.drop_in_place(INDEX_COLUMN)?;
            log::debug!("Dropped residual '{}' column", INDEX_COLUMN);
        }

        log::info!("Cleaned {} of {} user record(s)", users.height(), rows);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleaningError;
    use crate::frame::{date_values, int_values, require, text_values};
    use chrono::NaiveDate;

    fn users() -> DataFrame {
        df!(
            "index" => ["0", "NULL", "2", "3"],
            "first_name" => ["Sigfried", "NULL", "Maggie", "Guy"],
            "date_of_birth" => ["1968 October 16", "NULL", "GB9RPLGQ1K", "January 1987 30"],
            "join_date" => ["2018-12-23", "NULL", "2019-01-01", "2016 May 26"],
            "country" => ["Germany", "NULL", "United Kingdom", "United Kingdom"],
            "country_code" => ["DE", "NULL", "GB", "GGB"],
            "email_address" => [
                "rudi79@winkler.de",
                "NULL",
                "maggie@example.co.uk",
                "guy@@example.co.uk"
            ],
            "phone_number" => [
                "+49(0) 047905355",
                "NULL",
                "07911 123456",
                "+44(0)1632 960 123x45"
            ],
            "address" => [
                "zimmerstr. 1/0, 59015 gießen",
                "NULL",
                "flat 1",
                "FLAT 72W SALLY ISLE"
            ],
        )
        .unwrap()
    }

    fn text(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        text_values(require(df, column).unwrap()).unwrap()[row].clone()
    }

    #[test]
    fn test_clean_users() {
        let cleaned = UserCleaner::default().transform(users()).unwrap();

        assert_eq!(cleaned.height(), 2);
        assert!(!has_column(&cleaned, "index"));
        assert!(has_column(&cleaned, "phone_extension"));

        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        let births = date_values(require(&cleaned, "date_of_birth").unwrap()).unwrap();
        assert_eq!(births, vec![date(1968, 10, 16), date(1987, 1, 30)]);
        let joined = date_values(require(&cleaned, "join_date").unwrap()).unwrap();
        assert_eq!(joined[1], date(2016, 5, 26));

        assert_eq!(text(&cleaned, "country_code", 1).as_deref(), Some("GB"));
        assert_eq!(
            text(&cleaned, "email_address", 1).as_deref(),
            Some("guy@example.co.uk")
        );
        assert_eq!(
            int_values(require(&cleaned, "phone_number").unwrap()).unwrap(),
            vec![Some(4947905355), Some(441632960123)]
        );
        assert_eq!(
            int_values(require(&cleaned, "phone_extension").unwrap()).unwrap(),
            vec![None, Some(45)]
        );
        assert_eq!(
            text(&cleaned, "address", 1).as_deref(),
            Some("Flat 72W Sally Isle")
        );

        for name in CATEGORICAL_COLUMNS {
            assert!(matches!(
                require(&cleaned, name).unwrap().dtype(),
                DataType::Categorical(..)
            ));
        }
    }

    #[test]
    fn test_unsupported_country_is_reported() {
        let mut df = users().head(Some(1));
        df.with_column(Series::new("country_code".into(), ["FR"]))
            .unwrap();
        df.with_column(Series::new("country".into(), ["France"]))
            .unwrap();

        let err = UserCleaner::default().transform(df).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CleaningError>(),
            Some(&CleaningError::UnsupportedCountry {
                row: 0,
                country_code: "FR".to_string()
            })
        );
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut df = users();
        df.drop_in_place("join_date").unwrap();

        let err = UserCleaner::default().transform(df).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CleaningError>(),
            Some(&CleaningError::MissingColumn("join_date".to_string()))
        );
    }
}
