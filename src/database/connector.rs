//! Database connections

use super::sql::{self, SqlKind, SqlParam, quote_ident};
use crate::config::DatabaseCredentials;
use crate::frame::{date_series, datetime_series};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use eyre::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};

/// Builds connections from a set of credentials
///
/// # Example
/// ```no_run
/// use retail_etl::database::DatabaseConnector;
///
/// # async fn example() -> eyre::Result<()> {
/// let db = DatabaseConnector::from_file("db_creds.yaml")?.connect().await?;
/// for table in db.list_tables().await? {
///     println!("{}", table);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConnector {
    credentials: DatabaseCredentials,
}

impl DatabaseConnector {
    pub fn new(credentials: DatabaseCredentials) -> Self {
        Self { credentials }
    }

    /// Create a connector from a YAML credentials file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(DatabaseCredentials::read(path)?))
    }

    pub fn credentials(&self) -> &DatabaseCredentials {
        &self.credentials
    }

    /// Open a connection
    ///
    /// The driver's connection task is spawned onto the current runtime and
    /// lives until the returned [`Database`] is dropped.
    ///
    /// # Errors
    /// Returns an error if the server is unreachable or rejects the credentials
    pub async fn connect(&self) -> Result<Database> {
        log::debug!("Connecting to {}", self.credentials);
        let (client, connection) = self
            .credentials
            .to_pg_config()
            .connect(NoTls)
            .await
            .with_context(|| format!("Failed to connect to {}", self.credentials))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Database connection error: {}", e);
            }
        });

        log::info!("Connected to {}", self.credentials);
        Ok(Database { client })
    }
}

/// An open connection to a PostgreSQL-compatible database
pub struct Database {
    client: Client,
}

impl Database {
    /// Names of the tables in the `public` schema
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT tablename::text FROM pg_catalog.pg_tables \
                 WHERE schemaname = 'public' ORDER BY tablename",
                &[],
            )
            .await
            .context("Failed to list tables")?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Into::into))
            .collect()
    }

    /// Read every row of a table with the column types reported by the server
    ///
    /// Columns of types without a [`SqlKind`] counterpart are read as text.
    ///
    /// # Errors
    /// Returns an error if the table does not exist or a query fails
    pub async fn read_table(&self, table_name: &str) -> Result<DataFrame> {
        let table = quote_ident(table_name);

        let described = self
            .client
            .prepare(&format!("SELECT * FROM {}", table))
            .await
            .with_context(|| format!("Failed to read table '{}'", table_name))?;

        let select_list = described
            .columns()
            .iter()
            .map(|c| sql::select_expr(c.name(), c.type_()))
            .collect::<Vec<_>>()
            .join(", ");

        let statement = self
            .client
            .prepare(&format!("SELECT {} FROM {}", select_list, table))
            .await
            .with_context(|| format!("Failed to prepare query for '{}'", table_name))?;

        let rows = self
            .client
            .query(&statement, &[])
            .await
            .with_context(|| format!("Failed to query table '{}'", table_name))?;

        let columns = statement
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, c)| read_column(&rows, idx, c.name(), c.type_()).map(Series::into_column))
            .collect::<Result<Vec<_>>>()?;
        let df = DataFrame::new(columns)?;

        log::info!(
            "Read {} row(s) x {} column(s) from '{}'",
            df.height(),
            df.width(),
            table_name
        );
        Ok(df)
    }

    /// Replace a table with the contents of `df`
    ///
    /// Drops any existing table of the same name, creates it with column types
    /// derived from the column dtypes, then inserts every row. There is no
    /// enclosing transaction.
    ///
    /// Returns the number of rows written
    pub async fn write_table(&self, df: &DataFrame, name: &str) -> Result<usize> {
        self.client
            .batch_execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
            .await
            .with_context(|| format!("Failed to drop table '{}'", name))?;

        self.client
            .batch_execute(&sql::create_table_sql(df, name))
            .await
            .with_context(|| format!("Failed to create table '{}'", name))?;
        log::debug!("Created table '{}' with {} column(s)", name, df.width());

        if df.width() == 0 {
            return Ok(0);
        }

        let types: Vec<Type> = df
            .dtypes()
            .iter()
            .map(|dtype| sql::sql_type(sql::kind_for_dtype(dtype)))
            .collect();
        let statement = self
            .client
            .prepare_typed(&sql::insert_sql(df, name), &types)
            .await
            .with_context(|| format!("Failed to prepare insert into '{}'", name))?;

        let columns: Vec<Vec<SqlParam>> = df
            .get_columns()
            .iter()
            .map(|c| sql::column_params(c.as_materialized_series()))
            .collect::<Result<_>>()?;

        for i in 0..df.height() {
            let refs: Vec<&(dyn ToSql + Sync)> = columns
                .iter()
                .map(|params| params[i].as_ref() as &(dyn ToSql + Sync))
                .collect();

            self.client
                .execute(&statement, &refs)
                .await
                .with_context(|| format!("Failed to insert row {} into '{}'", i, name))?;
        }

        log::info!("Wrote {} row(s) to '{}'", df.height(), name);
        Ok(df.height())
    }
}

fn read_column(rows: &[Row], idx: usize, name: &str, ty: &Type) -> Result<Series> {
    let series = match sql::kind_for_type(ty) {
        Some(SqlKind::Integer) if *ty == Type::INT2 => {
            let values = collect(rows, |row| {
                Ok(row.try_get::<_, Option<i16>>(idx)?.map(i64::from))
            })?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Integer) if *ty == Type::INT4 => {
            let values = collect(rows, |row| {
                Ok(row.try_get::<_, Option<i32>>(idx)?.map(i64::from))
            })?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Integer) => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<i64>>(idx)?))?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Float) if *ty == Type::FLOAT4 => {
            let values = collect(rows, |row| {
                Ok(row.try_get::<_, Option<f32>>(idx)?.map(f64::from))
            })?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Float) => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<f64>>(idx)?))?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Boolean) => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<bool>>(idx)?))?;
            Series::new(name.into(), values)
        }
        Some(SqlKind::Date) => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<NaiveDate>>(idx)?))?;
            date_series(name, values)?
        }
        Some(SqlKind::Timestamp) if *ty == Type::TIMESTAMPTZ => {
            let values = collect(rows, |row| {
                Ok(row
                    .try_get::<_, Option<DateTime<Utc>>>(idx)?
                    .map(|ts| ts.naive_utc()))
            })?;
            datetime_series(name, values)?
        }
        Some(SqlKind::Timestamp) => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<NaiveDateTime>>(idx)?))?;
            datetime_series(name, values)?
        }
        _ => {
            let values = collect(rows, |row| Ok(row.try_get::<_, Option<String>>(idx)?))?;
            Series::new(name.into(), values)
        }
    };
    Ok(series)
}

fn collect<T>(rows: &[Row], cell: impl Fn(&Row) -> Result<Option<T>>) -> Result<Vec<Option<T>>> {
    rows.iter().map(cell).collect()
}
