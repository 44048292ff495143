use log::{debug, info};
use std::time::Duration;

use crate::error_handling::types::TransportError;

/// Default public endpoint of the VPN Gate server list export.
pub const DEFAULT_LIST_URL: &str = "https://www.vpngate.net/api/iphone/";

/// Downloads the raw published server list.
///
/// One request, one timeout, no retries. Retry policy belongs to whoever
/// drives the whole pipeline, not to this layer.
pub struct ListFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ListFetcher {
    /// Creates a fetcher with a per-request timeout.
    ///
    /// Returns `TransportError::Other` if the HTTP client cannot be built
    /// (TLS backend initialization, essentially).
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Fetches `url` and returns the raw response body.
    ///
    /// Non-success HTTP statuses map to `TransportError::HttpStatus`;
    /// everything else maps through the `reqwest::Error` conversion.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        info!("Fetching server list from {}", url);
        debug!("Request timeout: {:?}", self.timeout);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        info!("Fetched server list: {} bytes", body.len());
        Ok(body.to_vec())
    }
}
