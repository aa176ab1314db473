//! Upstream documents for tests.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn fresh_expires() -> String {
    http_date(Utc::now() + chrono::Duration::minutes(30))
}

pub fn point_json(base: &str) -> Value {
    json!({
        "properties": {
            "gridId": "CLE",
            "gridX": 33,
            "gridY": 42,
            "forecast": format!("{}/gridpoints/CLE/33,42/forecast", base),
            "forecastHourly": format!("{}/gridpoints/CLE/33,42/forecast/hourly", base),
            "forecastGridData": format!("{}/gridpoints/CLE/33,42", base),
            "relativeLocation": {
                "properties": { "city": "Tiffin", "state": "OH" }
            }
        }
    })
}

pub fn period_json(number: u32, start_time: &str) -> Value {
    json!({
        "number": number,
        "name": format!("Period {}", number),
        "startTime": start_time,
        "endTime": start_time,
        "isDaytime": true,
        "temperature": 60 + number as i32,
        "temperatureUnit": "F",
        "temperatureTrend": null,
        "windSpeed": "5 mph",
        "windDirection": "SW",
        "shortForecast": "Sunny",
        "detailedForecast": format!("Sunny, period {}.", number)
    })
}

pub fn forecast_json(generated_at: DateTime<Utc>, periods: usize) -> Value {
    let start = generated_at;
    let periods: Vec<Value> = (0..periods)
        .map(|i| {
            let start_time = (start + chrono::Duration::hours(i as i64)).to_rfc3339();
            period_json(i as u32 + 1, &start_time)
        })
        .collect();

    json!({
        "properties": {
            "generatedAt": generated_at.to_rfc3339(),
            "periods": periods
        }
    })
}

pub fn alerts_json(ids: &[&str]) -> Value {
    let features: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "properties": {
                    "event": "Flood Warning",
                    "severity": "Severe",
                    "description": "River rising.\n\nExpect flooding.",
                    "instruction": "Turn around.\n\nDon't drown."
                }
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

pub fn grid_json() -> Value {
    let now = Utc::now();
    json!({
        "properties": {
            "relativeHumidity": {
                "uom": "wmoUnit:percent",
                "values": [
                    {
                        "validTime": format!("{}/PT2H", (now - chrono::Duration::hours(1)).to_rfc3339()),
                        "value": 64.0
                    }
                ]
            }
        }
    })
}
