use crate::record::PollutionRecord;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Path of the latest-records endpoint, relative to the backend base URL
pub const DATA_PATH: &str = "/api/data";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed payload from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: simd_json::Error,
    },
}

/// Anything that can produce the newest-first record list for one cycle.
pub trait RecordSource: Send + Sync {
    fn fetch_records(&self) -> Result<Vec<PollutionRecord>, FetchError>;

    /// Fetch for one refresh cycle. Every failure is logged and reported as
    /// "no data", which callers treat the same as an empty payload.
    fn fetch_latest(&self) -> Vec<PollutionRecord> {
        match self.fetch_records() {
            Ok(records) => records,
            Err(err) => {
                error!(%err, "error fetching dashboard data");
                Vec::new()
            }
        }
    }
}

/// Blocking HTTP client for `GET /api/data`
pub struct DataClient {
    http: Client,
    url: String,
}

impl DataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: data_url(base_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RecordSource for DataClient {
    fn fetch_records(&self) -> Result<Vec<PollutionRecord>, FetchError> {
        let network = |source| FetchError::Network {
            url: self.url.clone(),
            source,
        };

        let response = self.http.get(&self.url).send().map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let mut body = response.bytes().map_err(network)?.to_vec();
        debug!(bytes = body.len(), "received /api/data payload");
        parse_records(&mut body).map_err(|source| FetchError::Malformed {
            url: self.url.clone(),
            source,
        })
    }
}

/// Parse a JSON array of records. simd-json parses in place, hence `&mut`.
pub fn parse_records(body: &mut [u8]) -> Result<Vec<PollutionRecord>, simd_json::Error> {
    simd_json::serde::from_slice(body)
}

fn data_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), DATA_PATH)
}
