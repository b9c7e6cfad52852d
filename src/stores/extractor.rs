//! Paginated store details extractor

use crate::client::StoresClient;
use crate::etl::Extractor;
use crate::frame::from_json_records;
use eyre::Result;
use polars::prelude::DataFrame;
use serde_json::{Map, Value};

/// Field every store record carries its position in
const INDEX_FIELD: &str = "index";

/// Extractor for the store details API
///
/// Asks the count endpoint how many stores exist, fetches them one at a time
/// and assembles a single frame ordered by each record's `index` field.
///
/// # Example
/// ```no_run
/// use retail_etl::client::{Auth, StoresClient};
/// use retail_etl::etl::Extractor;
/// use retail_etl::stores::StoresExtractor;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://api.example.com/prod/")?;
/// let client = StoresClient::try_new(url, Auth::Apikey("secret".to_string()))?;
/// let stores = StoresExtractor::new(client).extract().await?;
/// # Ok(())
/// # }
/// ```
pub struct StoresExtractor {
    client: StoresClient,
}

impl StoresExtractor {
    pub fn new(client: StoresClient) -> Self {
        Self { client }
    }

    /// Fetch every store, sequentially, into one frame
    pub async fn fetch_paginated_resource(&self) -> Result<DataFrame> {
        let count = self.client.number_of_stores().await?;

        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            records.push(self.client.store_details(index).await?);
            if (index + 1) % 50 == 0 {
                log::debug!("Fetched {}/{} stores", index + 1, count);
            }
        }
        log::info!("Fetched {} store(s) from {}", records.len(), self.client);

        assemble_store_records(records)
    }
}

/// Build a frame from store records ordered by their `index` field.
///
/// # Errors
/// Fails if a record has no integer `index`.
pub fn assemble_store_records(records: Vec<Map<String, Value>>) -> Result<DataFrame> {
    let mut keyed = records
        .into_iter()
        .enumerate()
        .map(|(position, record)| -> Result<(i64, Map<String, Value>)> {
            let index = record
                .get(INDEX_FIELD)
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    eyre::eyre!(
                        "Store record {} has no integer '{}' field",
                        position,
                        INDEX_FIELD
                    )
                })?;
            Ok((index, record))
        })
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by_key(|(index, _)| *index);

    let records: Vec<Map<String, Value>> = keyed.into_iter().map(|(_, r)| r).collect();
    from_json_records(&records)
}

impl Extractor for StoresExtractor {
    type Item = DataFrame;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        Ok(vec![self.fetch_paginated_resource().await?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{int_values, require, text_values};
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_rows_follow_index_field() {
        let records = vec![
            record(json!({"index": 2, "store_code": "HA-7C5F1E", "staff_numbers": "34"})),
            record(json!({"index": 0, "store_code": "WEB-1388012W", "address": null})),
            record(json!({"index": 1, "store_code": "BA-0E6AD3", "staff_numbers": "12"})),
        ];

        let df = assemble_store_records(records).unwrap();
        assert_eq!(df.height(), 3);

        let codes = text_values(require(&df, "store_code").unwrap()).unwrap();
        assert_eq!(
            codes,
            vec![
                Some("WEB-1388012W".to_string()),
                Some("BA-0E6AD3".to_string()),
                Some("HA-7C5F1E".to_string())
            ]
        );

        let index = int_values(require(&df, "index").unwrap()).unwrap();
        assert_eq!(index, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(require(&df, "address").unwrap().null_count(), 3);
        assert_eq!(
            text_values(require(&df, "staff_numbers").unwrap()).unwrap()[0],
            None
        );
    }

    #[test]
    fn test_missing_index_is_an_error() {
        let records = vec![record(json!({"store_code": "X"}))];
        let err = assemble_store_records(records).unwrap_err();
        assert!(err.to_string().contains("no integer 'index'"));
    }
}
