use serde::Serialize;
use std::collections::HashSet;

use super::client::NwsClient;
use super::error::NwsError;
use super::types::{FeatureCollection, Forecast, Point};

/// Everything needed to render the weather at one coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastBundle {
    pub point: Point,
    pub forecast: Forecast,
    pub forecast_hourly: Forecast,
    pub alerts: FeatureCollection,
}

impl NwsClient {
    /// Looks up point, forecast, hourly forecast and alerts in that order.
    /// The first failing step's error is returned as-is; there is no
    /// partial bundle.
    pub async fn forecast_bundle(&self, lat: f64, lng: f64) -> Result<ForecastBundle, NwsError> {
        let point = self.points(lat, lng).await?;
        let forecast = self.forecast(&point).await?;
        let forecast_hourly = self.forecast_hourly(&point).await?;
        let mut alerts = self.active_alerts(lat, lng).await?;
        dedup_alerts(&mut alerts);

        Ok(ForecastBundle {
            point,
            forecast,
            forecast_hourly,
            alerts,
        })
    }
}

/// Overlapping zone queries can repeat a feature; keep the first of each id.
pub fn dedup_alerts(alerts: &mut FeatureCollection) {
    let mut seen = HashSet::new();
    alerts
        .features
        .retain(|feature| seen.insert(feature.id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::nws::error::{Endpoint, ErrorKind};
    use crate::nws::fixtures::*;
    use chrono::Utc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok_json(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("Expires", fresh_expires().as_str())
            .set_body_json(body)
    }

    async fn mount_forecasts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/points/41.1150,-83.1770"))
            .respond_with(ok_json(point_json(&server.uri())))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/CLE/33,42/forecast"))
            .respond_with(ok_json(forecast_json(Utc::now(), 14)))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/CLE/33,42/forecast/hourly"))
            .respond_with(ok_json(forecast_json(Utc::now(), 24)))
            .expect(1)
            .mount(server)
            .await;
    }

    fn test_client(server: &MockServer) -> NwsClient {
        let config = Config {
            nws_base_url: server.uri(),
            retry_base_delay_ms: 1,
            ..Config::default()
        };
        NwsClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_bundle_dedups_alerts() {
        let server = MockServer::start().await;
        mount_forecasts(&server).await;
        Mock::given(method("GET"))
            .and(path("/alerts/active"))
            .respond_with(ok_json(alerts_json(&["urn:a", "urn:b", "urn:a"])))
            .expect(1)
            .mount(&server)
            .await;

        let bundle = test_client(&server)
            .forecast_bundle(41.115, -83.177)
            .await
            .unwrap();

        assert_eq!(bundle.point.city(), "Tiffin");
        assert_eq!(bundle.forecast.periods().len(), 14);
        assert_eq!(bundle.forecast_hourly.periods().len(), 24);
        let ids: Vec<_> = bundle.alerts.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["urn:a", "urn:b"]);
    }

    #[tokio::test]
    async fn test_alerts_failure_fails_whole_bundle() {
        let server = MockServer::start().await;
        mount_forecasts(&server).await;
        Mock::given(method("GET"))
            .and(path("/alerts/active"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "title": "Service Unavailable",
                "type": "https://api.weather.gov/problems/ServiceUnavailable",
                "status": 503,
                "detail": "Alerts are temporarily unavailable"
            })))
            .expect(6)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .forecast_bundle(41.115, -83.177)
            .await
            .unwrap_err();

        assert_eq!(err.endpoint, Endpoint::Alerts);
        assert_eq!(err.status(), 503);
        assert!(matches!(err.kind, ErrorKind::UpstreamStatus(_)));
    }

    #[tokio::test]
    async fn test_points_failure_skips_later_steps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/points/41.1150,-83.1770"))
            .respond_with(ResponseTemplate::new(200).set_body_json(point_json(&server.uri())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alerts/active"))
            .respond_with(ok_json(alerts_json(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .forecast_bundle(41.115, -83.177)
            .await
            .unwrap_err();

        assert_eq!(err.endpoint, Endpoint::Points);
        assert!(matches!(err.kind, ErrorKind::FreshnessHeader(_)));
    }

    #[test]
    fn test_dedup_alerts_keeps_first_occurrence() {
        let mut alerts: FeatureCollection =
            serde_json::from_value(alerts_json(&["urn:x", "urn:x", "urn:y", "urn:x"])).unwrap();
        alerts.features[0].properties.event = "First".to_string();

        dedup_alerts(&mut alerts);

        assert_eq!(alerts.features.len(), 2);
        assert_eq!(alerts.features[0].properties.event, "First");
        assert_eq!(alerts.features[1].id, "urn:y");
    }
}
