//! SQL text and type mapping between data frames and PostgreSQL

use crate::frame::{date_values, float_values, int_values, text_values, timestamp_values};
use eyre::Result;
use polars::prelude::*;
use tokio_postgres::types::{ToSql, Type};

/// A boxed statement parameter that can be held across awaits
pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// The column shapes that travel between PostgreSQL and a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
}

/// Quote a possibly schema-qualified identifier (`schema.table`).
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Kind for a PostgreSQL type, `None` when the type must be read as text.
pub fn kind_for_type(ty: &Type) -> Option<SqlKind> {
    if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        Some(SqlKind::Text)
    } else if [Type::INT2, Type::INT4, Type::INT8].contains(ty) {
        Some(SqlKind::Integer)
    } else if [Type::FLOAT4, Type::FLOAT8].contains(ty) {
        Some(SqlKind::Float)
    } else if *ty == Type::BOOL {
        Some(SqlKind::Boolean)
    } else if *ty == Type::DATE {
        Some(SqlKind::Date)
    } else if [Type::TIMESTAMP, Type::TIMESTAMPTZ].contains(ty) {
        Some(SqlKind::Timestamp)
    } else {
        None
    }
}

/// Kind a column of `dtype` is written as. Categoricals are written as text.
pub fn kind_for_dtype(dtype: &DataType) -> SqlKind {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => SqlKind::Integer,
        DataType::Float32 | DataType::Float64 => SqlKind::Float,
        DataType::Boolean => SqlKind::Boolean,
        DataType::Date => SqlKind::Date,
        DataType::Datetime(..) => SqlKind::Timestamp,
        _ => SqlKind::Text,
    }
}

/// Select expression for a source column, casting unsupported types to text.
pub fn select_expr(name: &str, ty: &Type) -> String {
    match kind_for_type(ty) {
        Some(_) => quote_ident(name),
        None => format!("{}::text AS {}", quote_ident(name), quote_ident(name)),
    }
}

/// Target column type for a kind
pub fn sql_type(kind: SqlKind) -> Type {
    match kind {
        SqlKind::Text => Type::TEXT,
        SqlKind::Integer => Type::INT8,
        SqlKind::Float => Type::FLOAT8,
        SqlKind::Boolean => Type::BOOL,
        SqlKind::Date => Type::DATE,
        SqlKind::Timestamp => Type::TIMESTAMP,
    }
}

fn sql_type_name(kind: SqlKind) -> &'static str {
    match kind {
        SqlKind::Text => "TEXT",
        SqlKind::Integer => "BIGINT",
        SqlKind::Float => "DOUBLE PRECISION",
        SqlKind::Boolean => "BOOLEAN",
        SqlKind::Date => "DATE",
        SqlKind::Timestamp => "TIMESTAMP",
    }
}

pub fn create_table_sql(df: &DataFrame, name: &str) -> String {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            format!(
                "{} {}",
                quote_ident(c.name()),
                sql_type_name(kind_for_dtype(c.dtype()))
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(name), columns)
}

pub fn insert_sql(df: &DataFrame, name: &str) -> String {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| quote_ident(c.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=df.width())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        columns,
        placeholders
    )
}

fn boxed<T: ToSql + Sync + Send + 'static>(values: Vec<T>) -> Vec<SqlParam> {
    values.into_iter().map(|v| Box::new(v) as SqlParam).collect()
}

/// One parameter per cell of `series`, typed by [`kind_for_dtype`].
pub fn column_params(series: &Series) -> Result<Vec<SqlParam>> {
    Ok(match kind_for_dtype(series.dtype()) {
        SqlKind::Text => boxed(text_values(series)?),
        SqlKind::Integer => boxed(int_values(series)?),
        SqlKind::Float => boxed(float_values(series)?),
        SqlKind::Boolean => boxed(series.bool()?.into_iter().collect::<Vec<_>>()),
        SqlKind::Date => boxed(date_values(series)?),
        SqlKind::Timestamp => boxed(timestamp_values(series)?),
    })
}
