//! The campus bus widget API: a stop listing and per route predictions
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use super::{FetchError, JsonClient, PredictionSource, StopSource, parse_url};
use crate::model::{Stop, StopRecord};

pub const DEFAULT_STOPS_URL: &str = "https://m.gatech.edu/widget/buses/content/api/stop";
pub const DEFAULT_PREDICTIONS_URL: &str =
    "https://m.gatech.edu/widget/buses/content/api/predict/";

#[derive(Clone, Debug)]
pub struct CampusBusApi {
    http: JsonClient,
    stops_url: Url,
    /// Always ends with a `/` so route ids join onto it
    predictions_url: Url,
}

impl CampusBusApi {
    pub fn new(
        http: JsonClient,
        stops_url: &str,
        predictions_url: &str,
    ) -> Result<Self, FetchError> {
        let predictions_url = if predictions_url.ends_with('/') {
            parse_url(predictions_url)?
        } else {
            parse_url(&format!("{predictions_url}/"))?
        };

        Ok(CampusBusApi {
            http,
            stops_url: parse_url(stops_url)?,
            predictions_url,
        })
    }

    /// `{predictions_url}{route_id}?stop={stop_id}`
    pub fn prediction_url(&self, route_id: &str, stop_id: &str) -> Result<Url, FetchError> {
        let mut url = self
            .predictions_url
            .join(route_id)
            .map_err(|e| FetchError::InvalidUrl(format!("route {route_id}: {e}")))?;

        url.query_pairs_mut().append_pair("stop", stop_id);

        Ok(url)
    }
}

impl StopSource for CampusBusApi {
    #[tracing::instrument(err, skip(self))]
    async fn fetch_stops(&self) -> Result<Vec<Stop>, FetchError> {
        let records: Vec<StopRecord> = self.http.get_json(self.stops_url.clone()).await?;

        info!("got {} stops", records.len());

        Ok(records.into_iter().map(Stop::from).collect())
    }
}

impl PredictionSource for CampusBusApi {
    #[tracing::instrument(err, skip(self))]
    async fn fetch_prediction(&self, route_id: &str, stop_id: &str) -> Result<Value, FetchError> {
        let url = self.prediction_url(route_id, stop_id)?;

        self.http.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api(predictions_url: &str) -> Result<CampusBusApi, anyhow::Error> {
        let http = JsonClient::new(Duration::from_secs(1))?;

        Ok(CampusBusApi::new(http, DEFAULT_STOPS_URL, predictions_url)?)
    }

    #[test]
    fn test_prediction_url() -> Result<(), anyhow::Error> {
        let url = api(DEFAULT_PREDICTIONS_URL)?.prediction_url("blue", "fitthall_a")?;

        assert_eq!(
            url.as_str(),
            "https://m.gatech.edu/widget/buses/content/api/predict/blue?stop=fitthall_a"
        );

        Ok(())
    }

    #[test]
    fn test_prediction_url_without_trailing_slash() -> Result<(), anyhow::Error> {
        let url = api("http://localhost:8080/predict")?.prediction_url("red", "tech square")?;

        assert_eq!(url.as_str(), "http://localhost:8080/predict/red?stop=tech+square");

        Ok(())
    }

    #[test]
    fn test_invalid_urls() -> Result<(), anyhow::Error> {
        let http = JsonClient::new(Duration::from_secs(1))?;

        assert!(matches!(
            CampusBusApi::new(http, "not a url", DEFAULT_PREDICTIONS_URL),
            Err(FetchError::InvalidUrl(_))
        ));

        Ok(())
    }
}
