use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub nws_base_url: String,
    pub contact: String,
    pub photon_url: Option<String>,
    pub port: u16,
    pub default_lat: f64,
    pub default_lng: f64,
    pub http_timeout_secs: u64,
    pub retry_max: u32,
    pub retry_base_delay_ms: u64,
    pub max_forecast_age_hours: i64,
    /// Optional per-cache entry bound. Unset means unbounded.
    pub cache_capacity: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nws_base_url: "https://api.weather.gov".to_string(),
            contact: "skycast.local".to_string(),
            photon_url: None,
            port: 8151,
            default_lat: 41.115,
            default_lng: -83.177,
            http_timeout_secs: 30,
            retry_max: 5,
            retry_base_delay_ms: 100,
            max_forecast_age_hours: 24,
            cache_capacity: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let config = Config {
            nws_base_url: env::var("SKYCAST_NWS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.nws_base_url),
            contact: env::var("SKYCAST_CONTACT").unwrap_or(defaults.contact),
            photon_url: env::var("SKYCAST_PHOTON_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            port: parse_var("SKYCAST_PORT", defaults.port)?,
            default_lat: parse_var("SKYCAST_DEFAULT_LAT", defaults.default_lat)?,
            default_lng: parse_var("SKYCAST_DEFAULT_LNG", defaults.default_lng)?,
            http_timeout_secs: parse_var("SKYCAST_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            retry_max: parse_var("SKYCAST_RETRY_MAX", defaults.retry_max)?,
            retry_base_delay_ms: parse_var(
                "SKYCAST_RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            )?,
            max_forecast_age_hours: parse_var(
                "SKYCAST_MAX_FORECAST_AGE_HOURS",
                defaults.max_forecast_age_hours,
            )?,
            cache_capacity: match env::var("SKYCAST_CACHE_CAPACITY") {
                Ok(raw) => Some(raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SKYCAST_CACHE_CAPACITY is not a number: {}", raw)
                })?),
                Err(_) => None,
            },
        };

        if config.port < 80 {
            anyhow::bail!("port number is invalid: {}", config.port);
        }

        Ok(config)
    }

    /// The geocoding search collaborator is only usable when a Photon
    /// endpoint is configured.
    pub fn search_enabled(&self) -> bool {
        self.photon_url.is_some()
    }

    pub fn user_agent(&self) -> String {
        format!("skycast/{} {}", env!("CARGO_PKG_VERSION"), self.contact)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn max_forecast_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.max_forecast_age_hours)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
