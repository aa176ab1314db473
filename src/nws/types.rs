use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::is_current_interval;

/// Response of `/points/{lat},{lng}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub properties: PointProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointProperties {
    #[serde(default)]
    pub grid_id: String,
    #[serde(default)]
    pub grid_x: i32,
    #[serde(default)]
    pub grid_y: i32,
    #[serde(default)]
    pub forecast: String,
    #[serde(default)]
    pub forecast_hourly: String,
    #[serde(default)]
    pub forecast_grid_data: String,
    #[serde(default)]
    pub relative_location: RelativeLocation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelativeLocation {
    #[serde(default)]
    pub properties: Place,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl Point {
    pub fn city(&self) -> &str {
        &self.properties.relative_location.properties.city
    }

    pub fn state(&self) -> &str {
        &self.properties.relative_location.properties.state
    }
}

/// Response of the `forecast` and `forecastHourly` links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastProperties {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_daytime: bool,
    pub temperature: i32,
    pub temperature_unit: String,
    #[serde(default)]
    pub temperature_trend: Option<String>,
    #[serde(default)]
    pub wind_speed: String,
    #[serde(default)]
    pub wind_direction: String,
    #[serde(default)]
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

impl Forecast {
    pub fn periods(&self) -> &[Period] {
        &self.properties.periods
    }

    pub fn generated_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.properties.generated_at)
    }
}

/// Response of `/alerts/active`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFeature {
    pub id: String,
    pub properties: AlertProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertProperties {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instruction: Option<String>,
}

/// Response of the `forecastGridData` link. Only relative humidity is
/// decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridData {
    pub properties: GridProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub relative_humidity: GridLayer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridLayer {
    #[serde(default)]
    pub uom: String,
    #[serde(default)]
    pub values: Vec<GridValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridValue {
    pub valid_time: String,
    pub value: Option<f64>,
}

impl GridData {
    /// Relative humidity for the interval that contains `now`. Values
    /// with an unreadable `validTime` are skipped.
    pub fn current_relative_humidity(&self, now: DateTime<Utc>) -> Option<f64> {
        self.properties
            .relative_humidity
            .values
            .iter()
            .find(|v| is_current_interval(&v.valid_time, now).unwrap_or(false))
            .and_then(|v| v.value)
    }
}

/// Problem document returned by the upstream on failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetail {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub detail: String,
}

impl std::fmt::Display for ProblemDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.status, self.kind, self.detail)
    }
}
