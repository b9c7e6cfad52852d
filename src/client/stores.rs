//! Stores API client
//!
//! Provides `StoresClient` for the store details API:
//! - `GET {base}/number_stores` returns `{"number_stores": <n>}`
//! - `GET {base}/store_details/{index}` returns one store as a JSON object

use super::{API_KEY_HEADER, Auth};
use eyre::{Context, Result, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

#[derive(Debug, Deserialize)]
struct StoreCount {
    number_stores: usize,
}

/// HTTP client for the store details API.
///
/// Every request carries the configured authentication header.
///
/// # Example
/// ```no_run
/// use retail_etl::client::{Auth, StoresClient};
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://api.example.com/prod/")?;
/// let client = StoresClient::try_new(url, Auth::Apikey("secret".to_string()))?;
///
/// let count = client.number_of_stores().await?;
/// let first = client.store_details(0).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StoresClient {
    client: Client,
    url: Url,
}

impl StoresClient {
    /// Create a client for the API rooted at `url`.
    ///
    /// # Errors
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built
    pub fn try_new(mut url: Url, auth: Auth) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends in a slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        match auth {
            Auth::Apikey(apikey) => {
                headers.insert(API_KEY_HEADER, apikey.parse()?);
            }
            Auth::None => {}
        }
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, url })
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolve an API path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let path = path.strip_prefix('/').unwrap_or(path);
        self.url
            .join(path)
            .with_context(|| format!("Invalid API path: {}", path))
    }

    /// GET a path and parse the JSON body, failing on non-success statuses.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request to {}: {}", url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Request to {} failed ({}): {}", url, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Number of stores reported by the count endpoint
    pub async fn number_of_stores(&self) -> Result<usize> {
        let count: StoreCount = self.get_json("number_stores").await?;
        log::info!("API reports {} store(s)", count.number_stores);
        Ok(count.number_stores)
    }

    /// Details of the store at `index`
    pub async fn store_details(&self, index: usize) -> Result<Map<String, Value>> {
        self.get_json(&format!("store_details/{}", index))
            .await
            .with_context(|| format!("Failed to fetch store {}", index))
    }
}

impl std::fmt::Display for StoresClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
