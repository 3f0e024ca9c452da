//! FRED API client with rate limiting.

use crate::dates::{DateRange, parse_date};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// FRED API base URL
const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Default spacing between requests (FRED allows 120 requests per minute)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

/// A single dated observation; `value` is `None` where FRED reports `"."`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Observation date
    pub date: NaiveDate,
    /// Observed value
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// Rate limiter to stay under FRED's request quota
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Parse the body of a `series/observations` response.
pub fn parse_observations(body: &str) -> Result<Vec<Observation>> {
    let response: ObservationsResponse = serde_json::from_str(body)?;
    response
        .observations
        .into_iter()
        .map(|raw| {
            let date = parse_date(&raw.date)
                .ok_or_else(|| DataError::Parse(format!("Invalid FRED date: {}", raw.date)))?;
            let value = match raw.value.trim() {
                "." | "" => None,
                v => Some(
                    v.parse::<f64>()
                        .map_err(|e| DataError::Parse(format!("Invalid FRED value {}: {}", v, e)))?,
                ),
            };
            Ok(Observation { date, value })
        })
        .collect()
}

/// FRED API client with rate limiting
pub struct FredClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
    api_key: String,
}

impl FredClient {
    /// Create a new client with the default rate limit.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_rate_limit(api_key, DEFAULT_RATE_LIMIT)
    }

    /// Create a new client with a custom minimum interval between requests.
    pub fn with_rate_limit(api_key: impl Into<String>, min_interval: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DataError::Config("FRED API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: FRED_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at a different API root (e.g. a local mirror).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the observations of `series_id` inside `range`.
    ///
    /// # Example
    /// ```no_run
    /// use panelkit_data::{DateRange, fred::FredClient};
    ///
    /// # async fn example() -> panelkit_data::Result<()> {
    /// let client = FredClient::new("my-api-key")?;
    /// let range = DateRange::parse("2020-01-01", "2024-12-31")?;
    /// let unrate = client.get_series("UNRATE", &range).await?;
    /// println!("{} observations", unrate.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_series(&self, series_id: &str, range: &DateRange) -> Result<Vec<Observation>> {
        if series_id.is_empty() {
            return Err(DataError::FredApi("Empty series id".to_string()));
        }

        self.rate_limiter.lock().await.wait().await;

        let url = format!("{}/series/observations", self.base_url);
        let start = range.start.to_string();
        let end = range.end.to_string();
        debug!(series_id, %start, %end, "requesting FRED series");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
            ])
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::FredApi(format!(
                "Failed to fetch series {}: HTTP {}",
                series_id,
                response.status()
            )));
        }

        let body = response.text().await.map_err(DataError::Network)?;
        parse_observations(&body)
    }
}

impl std::fmt::Debug for FredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FredClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
