use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::nws::{Endpoint, ForecastBundle, NwsClient, NwsError};
use crate::utils::split_paragraphs;

const Q2H_MAX_PERIODS: usize = 6;
const BI_DAILY_MAX_PERIODS: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct Weather {
    pub title: String,
    pub version: String,
    pub location: String,
    pub now: WeatherNow,
    /// Every other hourly period, covering roughly the next 12 hours.
    pub q2h_timeline: Vec<WeatherPeriod>,
    /// Day and night periods for the next few days.
    pub bi_daily_timeline: Vec<WeatherPeriod>,
    pub relative_humidity: Option<f64>,
    pub search_enabled: bool,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherNow {
    pub temperature: i32,
    pub temperature_unit: String,
    pub forecast: String,
    pub wind_speed: String,
    pub wind_direction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherPeriod {
    pub name: String,
    pub forecast: String,
    pub hour: Option<u32>,
    pub temperature: i32,
    pub temperature_unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub event: String,
    pub severity: String,
    pub description: Vec<String>,
    pub instruction: Vec<String>,
}

impl Weather {
    pub fn from_bundle(bundle: &ForecastBundle, search_enabled: bool) -> Result<Self, NwsError> {
        let hourly = bundle.forecast_hourly.periods();
        let current = hourly.first().ok_or_else(|| {
            NwsError::contract_violation(Endpoint::ForecastHourly, "periods empty")
        })?;

        let location = format!(
            "{}, {}",
            bundle.point.city().to_lowercase(),
            bundle.point.state().to_lowercase()
        );

        let q2h_timeline = hourly
            .iter()
            .step_by(2)
            .take(Q2H_MAX_PERIODS)
            .map(|period| {
                let start = DateTime::parse_from_rfc3339(&period.start_time).map_err(|e| {
                    NwsError::contract_violation(
                        Endpoint::ForecastHourly,
                        format!("startTime '{}': {}", period.start_time, e),
                    )
                })?;
                Ok(WeatherPeriod {
                    name: period.name.clone(),
                    forecast: period.detailed_forecast.clone(),
                    hour: Some(start.hour()),
                    temperature: period.temperature,
                    temperature_unit: period.temperature_unit.clone(),
                })
            })
            .collect::<Result<Vec<_>, NwsError>>()?;

        let bi_daily_timeline = bundle
            .forecast
            .periods()
            .iter()
            .take(BI_DAILY_MAX_PERIODS)
            .map(|period| WeatherPeriod {
                name: period.name.clone(),
                forecast: period.detailed_forecast.clone(),
                hour: None,
                temperature: period.temperature,
                temperature_unit: period.temperature_unit.clone(),
            })
            .collect();

        let alerts = bundle
            .alerts
            .features
            .iter()
            .map(|feature| Alert {
                event: feature.properties.event.clone(),
                severity: feature.properties.severity.clone(),
                description: split_paragraphs(&feature.properties.description),
                instruction: feature
                    .properties
                    .instruction
                    .as_deref()
                    .map(split_paragraphs)
                    .unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            title: location.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            location,
            now: WeatherNow {
                temperature: current.temperature,
                temperature_unit: current.temperature_unit.clone(),
                forecast: current.short_forecast.clone(),
                wind_speed: current.wind_speed.clone(),
                wind_direction: current.wind_direction.clone(),
            },
            q2h_timeline,
            bi_daily_timeline,
            relative_humidity: None,
            search_enabled,
            alerts,
        })
    }
}

/// Builds the report for a coordinate. Humidity is a nice-to-have: a
/// failed grid lookup is logged and the report goes out without it.
pub async fn build_weather(
    nws: &NwsClient,
    lat: f64,
    lng: f64,
    search_enabled: bool,
) -> Result<Weather, NwsError> {
    let bundle = nws.forecast_bundle(lat, lng).await?;
    let mut weather = Weather::from_bundle(&bundle, search_enabled)?;

    match nws.grid_data(&bundle.point).await {
        Ok(grid) => weather.relative_humidity = grid.current_relative_humidity(Utc::now()),
        Err(e) => tracing::warn!("relative humidity unavailable: {}", e),
    }

    Ok(weather)
}
