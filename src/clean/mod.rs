//! Cleaning of extracted tables
//!
//! Each source has a [`Transformer`](crate::etl::Transformer) here. The
//! column-level steps they are built from are public so they can be reused
//! and tested on their own.

mod cards;
mod country;
mod dates;
mod missing;
mod phone;
mod reconcile;
mod text;
mod users;

pub use cards::{
    CardCleaner, KNOWN_PROVIDERS, clean_card_numbers, filter_unique_providers,
    sanitize_card_number,
};
pub use country::{correct_country_code, corrected_country_code};
pub use dates::{
    KNOWN_DATE_FORMATS, convert_date_column, convert_expiry_column,
    convert_free_form_date_column, parse_expiry_date, parse_free_form_date, parse_known_date,
};
pub use missing::MissingValueCleaner;
pub use phone::{
    EXTENSION_COLUMN, PHONE_COLUMN, PhoneNumber, check_dialling_code, clean_phone_numbers,
    normalize_phone_number, split_extension,
};
pub use reconcile::{MergedColumnRule, SchemaReconciler};
pub use text::{clean_email_address, clean_email_addresses, fix_address_case, title_case};
pub use users::UserCleaner;
