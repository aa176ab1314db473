use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, EXPIRES};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

use super::error::ErrorKind;
use super::types::ProblemDetail;
use crate::config::Config;

/// A successful upstream payload together with the deadline from its
/// `Expires` header.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Bytes,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.retry_max,
            base_delay: config.retry_base_delay(),
        }
    }

    /// Delay before each retry, in order: the base delay, doubling each
    /// time, with no jitter.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let base = self.base_delay;
        (0..self.max_retries).map(move |attempt| base.saturating_mul(2u32.saturating_pow(attempt)))
    }
}

/// Performs GETs against the upstream, retrying non-2xx statuses with
/// exponential backoff. Knows nothing about caching.
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        let client = Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(config),
        })
    }

    pub async fn get(&self, url: &str) -> Result<Fetched, ErrorKind> {
        let mut delays = self.retry.delays();

        loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status.is_success() {
                let expires = response.headers().get(EXPIRES).cloned();
                let body = response.bytes().await?;
                let expires_at = parse_expires(expires.as_ref())?;
                return Ok(Fetched { body, expires_at });
            }

            if let Some(delay) = delays.next() {
                tracing::warn!(
                    "upstream returned {} for {}, retrying in {}ms",
                    status,
                    url,
                    delay.as_millis()
                );

                sleep(delay).await;
                continue;
            }

            let body = response.bytes().await?;
            let mut problem: ProblemDetail = serde_json::from_slice(&body)?;
            if problem.status == 0 {
                problem.status = status.as_u16();
            }
            return Err(ErrorKind::UpstreamStatus(problem));
        }
    }
}

fn parse_expires(value: Option<&HeaderValue>) -> Result<DateTime<Utc>, ErrorKind> {
    let value = value.ok_or_else(|| ErrorKind::FreshnessHeader("expires header missing".to_string()))?;
    let raw = value
        .to_str()
        .map_err(|e| ErrorKind::FreshnessHeader(format!("expires header unreadable: {}", e)))?;

    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ErrorKind::FreshnessHeader(format!("expires '{}': {}", raw, e)))
}
