//! Text column fixes

use crate::frame::require;
use eyre::Result;
use polars::prelude::*;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static REPEATED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("@{2,}").expect("repeated @ pattern is valid"));

/// Collapse every run of `@` signs in an email address to a single `@`.
pub fn clean_email_address(email: &str) -> String {
    REPEATED_AT.replace_all(email, "@").into_owned()
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// A word starts at any letter that does not follow another letter, so
/// `"12 o'neil ROAD"` becomes `"12 O'Neil Road"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn map_text(df: &mut DataFrame, column: &str, f: impl Fn(&str) -> String) -> Result<()> {
    let f = &f;
    let mapped = require(df, column)?
        .str()?
        .apply(move |value| value.map(|s| Cow::Owned(f(s))))
        .into_series();
    df.with_column(mapped)?;
    Ok(())
}

/// Apply [`clean_email_address`] to a text column.
pub fn clean_email_addresses(df: &mut DataFrame, column: &str) -> Result<()> {
    map_text(df, column, clean_email_address)
}

/// Apply [`title_case`] to a text column.
pub fn fix_address_case(df: &mut DataFrame, column: &str) -> Result<()> {
    map_text(df, column, title_case)
}
