//! Remote data fetcher for the game data API.
//!
//! Wraps the five read-only JSON endpoints a refresh needs. Each call is
//! retried under the configured [`RetryPolicy`]; when the attempts run out the
//! caller gets an empty object and must treat the source as unavailable.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

use crate::config::NetworkConfig;
use crate::models::Upstream;
use crate::retry::RetryPolicy;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/104.0.5112.81 Safari/537.36 Edg/104.0.1293.47";

/// Upstream collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    DailyDungeon,
    Upgrade,
    Avatars,
    Weapons,
    Materials,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::DailyDungeon,
        Endpoint::Upgrade,
        Endpoint::Avatars,
        Endpoint::Weapons,
        Endpoint::Materials,
    ];

    /// Path below the API base.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::DailyDungeon => "v2/chs/dailyDungeon",
            Endpoint::Upgrade => "v2/static/upgrade",
            Endpoint::Avatars => "v2/chs/avatar",
            Endpoint::Weapons => "v2/chs/weapon",
            Endpoint::Materials => "v2/chs/material",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::DailyDungeon => "daily dungeon",
            Endpoint::Upgrade => "upgrade",
            Endpoint::Avatars => "avatar list",
            Endpoint::Weapons => "weapon list",
            Endpoint::Materials => "material list",
        };
        f.write_str(name)
    }
}

/// Errors from the data API layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    /// Transport failure, non-2xx status or undecodable body.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response parsed but carries no `data` object.
    #[error("{0} response has no data object")]
    MissingData(Endpoint),

    /// A collection came back empty after all retries.
    #[error("{0} data is unavailable")]
    Incomplete(Endpoint),

    /// A collection does not have the expected shape.
    #[error("{endpoint} data has an unexpected shape: {source}")]
    Shape {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of raw upstream collections.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The `data` object of an endpoint, or an empty map when unavailable.
    async fn fetch(&self, endpoint: Endpoint) -> Map<String, Value>;
}

/// Build the shared HTTP client with the API's expected headers.
pub fn http_client(network: &NetworkConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static("https://ambr.top/"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(network.timeout())
        .build()?)
}

/// HTTP client for the game data API.
pub struct AmbrClient {
    http: reqwest::Client,
    api_base: String,
    retry: RetryPolicy,
}

impl AmbrClient {
    pub fn new(network: &NetworkConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(http_client(network)?, network))
    }

    /// Reuse an existing client (shared connection pool with the asset cache).
    pub fn with_client(http: reqwest::Client, network: &NetworkConfig) -> Self {
        Self {
            http,
            api_base: network.api_base.trim_end_matches('/').to_string(),
            retry: network.retry_policy(),
        }
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.api_base, endpoint.path())
    }

    /// A single request without retry.
    async fn try_fetch(&self, endpoint: Endpoint) -> Result<Map<String, Value>, FetchError> {
        let body: Value =
            self.http.get(self.url(endpoint)).send().await?.error_for_status()?.json().await?;

        match body {
            Value::Object(mut root) => match root.remove("data") {
                Some(Value::Object(data)) => Ok(data),
                _ => Err(FetchError::MissingData(endpoint)),
            },
            _ => Err(FetchError::MissingData(endpoint)),
        }
    }
}

#[async_trait]
impl DataSource for AmbrClient {
    async fn fetch(&self, endpoint: Endpoint) -> Map<String, Value> {
        let what = endpoint.to_string();
        match self.retry.run(&what, || self.try_fetch(endpoint)).await {
            Ok(data) => data,
            Err(_) => {
                tracing::warn!(endpoint = %endpoint, "Data source unavailable");
                Map::new()
            }
        }
    }
}

/// Fetch all five collections and decode them into typed form.
///
/// Fails with [`FetchError::Incomplete`] when any collection is empty so that
/// a refresh never proceeds on partial data.
pub async fn fetch_upstream(source: &dyn DataSource) -> Result<Upstream, FetchError> {
    let (dungeons, upgrade, avatars, weapons, materials) = futures::join!(
        source.fetch(Endpoint::DailyDungeon),
        source.fetch(Endpoint::Upgrade),
        source.fetch(Endpoint::Avatars),
        source.fetch(Endpoint::Weapons),
        source.fetch(Endpoint::Materials),
    );

    Ok(Upstream {
        dungeons: decode(Endpoint::DailyDungeon, dungeons)?,
        upgrade: decode(Endpoint::Upgrade, upgrade)?,
        avatars: decode(Endpoint::Avatars, avatars)?,
        weapons: decode(Endpoint::Weapons, weapons)?,
        materials: decode(Endpoint::Materials, materials)?,
    })
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, data: Map<String, Value>) -> Result<T, FetchError> {
    if data.is_empty() {
        return Err(FetchError::Incomplete(endpoint));
    }
    serde_json::from_value(Value::Object(data))
        .map_err(|source| FetchError::Shape { endpoint, source })
}
