use bytes::Bytes;
use chrono::Utc;

use super::error::{AtEndpoint, Endpoint, ErrorKind, NwsError};
use super::fetch::Fetcher;
use super::types::*;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::utils::format_coordinates;

/// Client for the National Weather Service API.
///
/// Owns one cache per upstream resource kind. Construct once at startup
/// and share it between requests.
pub struct NwsClient {
    fetcher: Fetcher,
    base_url: String,
    max_forecast_age: chrono::Duration,
    points: TtlCache,
    forecasts: TtlCache,
    hourly_forecasts: TtlCache,
    grids: TtlCache,
    alerts: TtlCache,
}

impl NwsClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let capacity = config.cache_capacity;

        Ok(Self {
            fetcher: Fetcher::new(config)?,
            base_url: config.nws_base_url.trim_end_matches('/').to_string(),
            max_forecast_age: config.max_forecast_age(),
            points: TtlCache::new("points", capacity),
            forecasts: TtlCache::new("forecast", capacity),
            hourly_forecasts: TtlCache::new("forecast_hourly", capacity),
            grids: TtlCache::new("grid_data", capacity),
            alerts: TtlCache::new("alerts", capacity),
        })
    }

    /// `/points/{lat},{lng}`. The returned point always has non-empty
    /// forecast and hourly forecast links.
    pub async fn points(&self, lat: f64, lng: f64) -> Result<Point, NwsError> {
        let key = format_coordinates(lat, lng);
        let url = format!("{}/points/{}", self.base_url, key);

        let body = self
            .cached_get(&self.points, &key, &url)
            .await
            .at(Endpoint::Points)?;
        let point: Point = serde_json::from_slice(&body).at(Endpoint::Points)?;

        if point.properties.forecast.is_empty() {
            return Err(NwsError::contract_violation(Endpoint::Points, "forecast empty"));
        }
        if point.properties.forecast_hourly.is_empty() {
            return Err(NwsError::contract_violation(
                Endpoint::Points,
                "forecast hourly empty",
            ));
        }
        Ok(point)
    }

    pub async fn forecast(&self, point: &Point) -> Result<Forecast, NwsError> {
        let link = required_link(&point.properties.forecast, Endpoint::Forecast)?;

        let body = self
            .cached_get(&self.forecasts, link, link)
            .await
            .at(Endpoint::Forecast)?;
        decode_forecast(&body, Endpoint::Forecast)
    }

    /// Hourly forecast. Besides the HTTP-level expiry, the payload's own
    /// `generatedAt` must be within the configured age bound; a stale
    /// payload is dropped from the cache so the next call refetches it.
    pub async fn forecast_hourly(&self, point: &Point) -> Result<Forecast, NwsError> {
        let link = required_link(&point.properties.forecast_hourly, Endpoint::ForecastHourly)?;

        let body = self
            .cached_get(&self.hourly_forecasts, link, link)
            .await
            .at(Endpoint::ForecastHourly)?;
        let forecast = decode_forecast(&body, Endpoint::ForecastHourly)?;

        let generated_at = forecast.generated_at().map_err(|e| {
            NwsError::contract_violation(
                Endpoint::ForecastHourly,
                format!("generatedAt '{}': {}", forecast.properties.generated_at, e),
            )
        })?;

        let age = Utc::now().signed_duration_since(generated_at);
        if age > self.max_forecast_age {
            tracing::warn!(
                "hourly forecast for {} is {}h old, invalidating",
                link,
                age.num_hours()
            );
            self.hourly_forecasts.expire(link).await;
            return Err(NwsError::new(
                Endpoint::ForecastHourly,
                ErrorKind::StaleData {
                    generated_at,
                    age_hours: age.num_hours(),
                },
            ));
        }

        Ok(forecast)
    }

    pub async fn grid_data(&self, point: &Point) -> Result<GridData, NwsError> {
        let link = required_link(&point.properties.forecast_grid_data, Endpoint::GridData)?;

        let body = self
            .cached_get(&self.grids, link, link)
            .await
            .at(Endpoint::GridData)?;
        serde_json::from_slice(&body).at(Endpoint::GridData)
    }

    /// Active alerts at a coordinate. The full query URL is the cache key.
    pub async fn active_alerts(&self, lat: f64, lng: f64) -> Result<FeatureCollection, NwsError> {
        let url = alerts_url(&self.base_url, lat, lng);

        let body = self
            .cached_get(&self.alerts, &url, &url)
            .await
            .at(Endpoint::Alerts)?;
        serde_json::from_slice(&body).at(Endpoint::Alerts)
    }

    async fn cached_get(&self, cache: &TtlCache, key: &str, url: &str) -> Result<Bytes, ErrorKind> {
        if let Some(body) = cache.get(key).await {
            tracing::debug!("cache hit: {}", key);
            return Ok(body);
        }

        tracing::debug!("cache miss: {}, fetching {}", key, url);
        let fetched = self.fetcher.get(url).await?;
        cache.set(key, fetched.body.clone(), fetched.expires_at).await;
        Ok(fetched.body)
    }
}

fn required_link(link: &str, endpoint: Endpoint) -> Result<&str, NwsError> {
    if link.is_empty() {
        return Err(NwsError::contract_violation(endpoint, "link empty"));
    }
    Ok(link)
}

fn decode_forecast(body: &[u8], endpoint: Endpoint) -> Result<Forecast, NwsError> {
    let forecast: Forecast = serde_json::from_slice(body).at(endpoint)?;
    if forecast.periods().is_empty() {
        return Err(NwsError::contract_violation(endpoint, "periods empty"));
    }
    Ok(forecast)
}

fn alerts_url(base_url: &str, lat: f64, lng: f64) -> String {
    let params = [
        ("status", "actual".to_string()),
        ("message_type", "alert".to_string()),
        ("point", format_coordinates(lat, lng)),
        ("urgency", "Immediate,Expected".to_string()),
        ("certainty", "Observed,Likely,Possible".to_string()),
    ];
    let query = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}/alerts/active?{}", base_url, query)
}
