//! Helpers over polars [`DataFrame`]s
//!
//! Every extractor produces data frames, every cleaner consumes and returns
//! them, and every loader writes them out. Row order is significant; there is
//! no separate index, so dropping rows renumbers the remainder implicitly.

use crate::error::CleaningError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use eyre::Result;
use polars::prelude::*;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;
use std::fmt::Write;

/// Sentinel token used by the legacy sources in place of a real missing value
pub const NULL_TOKEN: &str = "NULL";

/// The dtype used for low-cardinality text columns
pub fn categorical() -> DataType {
    DataType::Categorical(None, CategoricalOrdering::Physical)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Set of column names, for layout comparisons.
pub fn column_set(df: &DataFrame) -> HashSet<String> {
    column_names(df).into_iter().collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Look up a column that the caller cannot do without.
pub fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, CleaningError> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| CleaningError::MissingColumn(name.to_string()))
}

/// Cells rendered as text; numbers and dates are formatted, nulls stay `None`.
pub fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let text = series.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub fn int_values(series: &Series) -> Result<Vec<Option<i64>>> {
    let ints = series.cast(&DataType::Int64)?;
    Ok(ints.i64()?.into_iter().collect())
}

pub fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// A `Date` series from calendar dates
pub fn date_series(name: &str, dates: Vec<Option<NaiveDate>>) -> Result<Series> {
    let epoch = NaiveDate::default();
    let days: Vec<Option<i32>> = dates
        .into_iter()
        .map(|date| date.and_then(|d| i32::try_from((d - epoch).num_days()).ok()))
        .collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

pub fn date_values(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let epoch = NaiveDate::default();
    let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(|d| epoch.checked_add_signed(Duration::days(d.into()))))
        .collect())
}

/// A microsecond `Datetime` series from naive timestamps
pub fn datetime_series(name: &str, timestamps: Vec<Option<NaiveDateTime>>) -> Result<Series> {
    let micros: Vec<Option<i64>> = timestamps
        .into_iter()
        .map(|ts| ts.map(|ts| ts.and_utc().timestamp_micros()))
        .collect();
    Ok(Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?)
}

pub fn timestamp_values(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    let micros = series
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(micros
        .i64()?
        .into_iter()
        .map(|m| m.and_then(DateTime::from_timestamp_micros).map(|ts| ts.naive_utc()))
        .collect())
}

/// Build a frame of text columns from rows of cells.
///
/// # Errors
/// [`CleaningError::RaggedRow`] when a row does not have one cell per column.
pub fn from_text_rows<S: AsRef<str>>(
    names: &[S],
    rows: Vec<Vec<Option<String>>>,
) -> Result<DataFrame> {
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != names.len() {
            return Err(CleaningError::RaggedRow {
                row: i,
                expected: names.len(),
                found: row.len(),
            }
            .into());
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    let columns = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_ref().into(), values).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Build a frame from JSON objects, columns in first-seen key order.
///
/// A column whose present values are all integers becomes `Int64`, all
/// numbers `Float64`, all booleans `Boolean`; anything else is text.
pub fn from_json_records(records: &[Map<String, Json>]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<Option<&Json>> = records
                .iter()
                .map(|r| r.get(*name).filter(|v| !v.is_null()))
                .collect();
            json_series(name, &values).into_column()
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn json_series(name: &str, values: &[Option<&Json>]) -> Series {
    let mut present = values.iter().flatten().peekable();
    let name: PlSmallStr = name.into();
    if present.peek().is_none() {
        return Series::full_null(name, values.len(), &DataType::String);
    }

    if present.clone().all(|v| v.is_i64()) {
        let ints: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Json::as_i64)).collect();
        Series::new(name, ints)
    } else if present.clone().all(|v| v.is_number()) {
        let floats: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Json::as_f64)).collect();
        Series::new(name, floats)
    } else if present.all(|v| v.is_boolean()) {
        let flags: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Json::as_bool)).collect();
        Series::new(name, flags)
    } else {
        let texts: Vec<Option<String>> = values
            .iter()
            .map(|v| {
                v.map(|v| match v {
                    Json::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        Series::new(name, texts)
    }
}

/// Replace every text cell equal to `token` with null. Returns the count replaced.
pub fn replace_sentinel(df: &mut DataFrame, token: &str) -> Result<usize> {
    let text_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().to_string())
        .collect();

    let mut replaced = 0;
    for name in text_columns {
        let series = require(df, &name)?;
        let before = series.null_count();
        let cleaned = series
            .str()?
            .apply(|value| value.filter(|s| *s != token).map(std::borrow::Cow::Borrowed))
            .into_series();
        replaced += cleaned.null_count() - before;
        df.with_column(cleaned)?;
    }
    Ok(replaced)
}

/// Drop rows where every column is null.
pub fn drop_empty_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut keep = BooleanChunked::full("keep".into(), false, df.height());
    for column in df.get_columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&keep)?)
}

/// Drop rows that are null in any of `names`.
pub fn drop_missing_in(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    for name in names {
        require(df, name)?;
    }
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    Ok(df.drop_nulls(Some(names.as_slice()))?)
}

/// Select exactly `names`, in that order.
///
/// # Errors
/// Fails if a name is unknown or the frame has columns not listed.
pub fn reorder<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<DataFrame> {
    for name in names {
        require(df, name.as_ref())?;
    }
    if let Some(extra) = column_names(df)
        .into_iter()
        .find(|c| !names.iter().any(|n| n.as_ref() == c))
    {
        return Err(CleaningError::UnexpectedColumn(extra).into());
    }
    Ok(df.select(names.iter().map(|n| n.as_ref()))?)
}

/// Cast a column to [`categorical`].
pub fn set_categorical(df: &mut DataFrame, name: &str) -> Result<()> {
    let cast = require(df, name)?.cast(&categorical())?;
    df.with_column(cast)?;
    Ok(())
}

/// Categorical columns back to plain text
pub fn decategorize(df: &mut DataFrame) -> Result<()> {
    let categorical: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::Categorical(..)))
        .map(|c| c.name().to_string())
        .collect();
    for name in categorical {
        let text = require(df, &name)?.cast(&DataType::String)?;
        df.with_column(text)?;
    }
    Ok(())
}

/// Stack frames sharing the first frame's column order, preserving row order.
///
/// Columns whose dtype differs from the first frame's are cast to it.
///
/// # Errors
/// [`CleaningError::SchemaMismatch`] if any frame's columns differ from the
/// first frame's.
pub fn concat(frames: Vec<DataFrame>) -> Result<DataFrame> {
    if frames.len() == 1 {
        return Ok(frames.into_iter().next().unwrap_or_default());
    }

    let mut frames = frames.into_iter();
    let Some(mut merged) = frames.next() else {
        return Ok(DataFrame::default());
    };
    decategorize(&mut merged)?;

    for (i, mut frame) in frames.enumerate() {
        if column_names(&frame) != column_names(&merged) {
            return Err(CleaningError::SchemaMismatch {
                page: i + 1,
                expected: column_names(&merged).join(", "),
                found: column_names(&frame).join(", "),
            }
            .into());
        }

        for (name, dtype) in column_names(&merged).iter().zip(merged.dtypes()) {
            let series = require(&frame, name)?;
            if series.dtype() != &dtype {
                let cast = series.cast(&dtype)?;
                frame.with_column(cast)?;
            }
        }
        merged.vstack_mut(&frame)?;
    }

    Ok(merged)
}

/// Summarise columns with their non-null counts and dtypes.
pub fn info(df: &DataFrame) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} rows x {} columns", df.height(), df.width());
    for (i, column) in df.get_columns().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:>8} non-null  {}",
            i,
            column.name().as_str(),
            column.len() - column.null_count(),
            column.dtype()
        );
    }
    out
}
