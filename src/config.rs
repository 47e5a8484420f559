use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::Position;
use crate::sources::{
    DEFAULT_PREDICTIONS_URL, DEFAULT_STOPS_URL, DevicePosition, HttpPosition, JsonClient,
    PositionError,
};

const GESTURES_HELP: &str = "Gestures, one per line on stdin:
  tap, t, r or an empty line   refresh
  swipeleft, left, n           next page
  swiperight, right, p         previous page
  swipedown, down, q           exit";

/// Live arrival predictions for the nearest campus bus stops
#[derive(Parser, Debug, Clone)]
#[command(version, about, after_help = GESTURES_HELP)]
pub struct Config {
    /// Endpoint listing every stop of every route
    #[arg(long, env = "STOPS_URL", default_value = DEFAULT_STOPS_URL)]
    pub stops_url: String,

    /// Prediction endpoint, the route id and `?stop=` are appended
    #[arg(long, env = "PREDICTIONS_URL", default_value = DEFAULT_PREDICTIONS_URL)]
    pub predictions_url: String,

    #[arg(long, env = "LATITUDE", requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, env = "LONGITUDE", requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Locator answering `{"latitude": .., "longitude": ..}`, used when no fixed position is given
    #[arg(long, env = "POSITION_URL")]
    pub position_url: Option<String>,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "LOG_DIR", default_value = "./logs")]
    pub log_dir: PathBuf,

    /// Export spans over OTLP/gRPC to this endpoint
    #[arg(long, env = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Draw the closest stops once and exit
    #[arg(long)]
    pub once: bool,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A fixed position wins over the locator
    pub fn position_source(&self, http: JsonClient) -> Result<DevicePosition, PositionError> {
        match (self.latitude, self.longitude, &self.position_url) {
            (Some(latitude), Some(longitude), _) => {
                Ok(DevicePosition::Fixed(Position::new(latitude, longitude)))
            }
            (_, _, Some(url)) => Ok(DevicePosition::Http(HttpPosition::new(http, url)?)),
            _ => Err(PositionError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http() -> Result<JsonClient, anyhow::Error> {
        JsonClient::new(Duration::from_secs(1))
    }

    #[test]
    fn test_fixed_position() -> Result<(), anyhow::Error> {
        let config = Config::try_parse_from([
            "campus_bus_stops",
            "--latitude",
            "33.7756",
            "--longitude",
            "-84.3963",
            "--position-url",
            "http://localhost:9000/where",
        ])?;

        match config.position_source(http()?)? {
            DevicePosition::Fixed(position) => {
                assert_eq!(position, Position::new(33.7756, -84.3963))
            }
            other => panic!("expected a fixed position, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn test_position_url() -> Result<(), anyhow::Error> {
        let config = Config::try_parse_from([
            "campus_bus_stops",
            "--position-url",
            "http://localhost:9000/where",
            "--once",
        ])?;

        assert!(config.once);
        assert!(matches!(
            config.position_source(http()?)?,
            DevicePosition::Http(_)
        ));

        Ok(())
    }

    #[test]
    fn test_latitude_requires_longitude() {
        assert!(Config::try_parse_from(["campus_bus_stops", "--latitude", "33.7756"]).is_err());
    }

    #[test]
    fn test_defaults() -> Result<(), anyhow::Error> {
        let config = Config::try_parse_from(["campus_bus_stops"])?;

        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(!config.once);

        Ok(())
    }
}
