use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use super::{FetchError, JsonClient, PositionSource, parse_url};
use crate::model::Position;

#[derive(thiserror::Error, Debug)]
pub enum PositionError {
    #[error("no position configured, pass --latitude and --longitude or --position-url")]
    NotConfigured,

    #[error("error fetching the position")]
    Fetch(#[from] FetchError),

    #[error("position {latitude},{longitude} is out of range")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Where the user is, either pinned by configuration or asked from a locator service
#[derive(Clone, Debug)]
pub enum DevicePosition {
    Fixed(Position),
    Http(HttpPosition),
}

#[derive(Clone, Debug)]
pub struct HttpPosition {
    http: JsonClient,
    url: Url,
}

impl HttpPosition {
    pub fn new(http: JsonClient, url: &str) -> Result<Self, PositionError> {
        Ok(HttpPosition {
            http,
            url: parse_url(url)?,
        })
    }
}

/// Accepts both a bare coordinate and the browser geolocation shape
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum PositionPayload {
    Geolocation { coords: Position },
    Bare(Position),
}

impl From<PositionPayload> for Position {
    fn from(value: PositionPayload) -> Self {
        match value {
            PositionPayload::Geolocation { coords } => coords,
            PositionPayload::Bare(position) => position,
        }
    }
}

fn checked(position: Position) -> Result<Position, PositionError> {
    if position.is_valid() {
        Ok(position)
    } else {
        Err(PositionError::OutOfRange {
            latitude: position.latitude,
            longitude: position.longitude,
        })
    }
}

impl PositionSource for DevicePosition {
    #[tracing::instrument(err, skip(self))]
    async fn current_position(&self) -> Result<Position, PositionError> {
        let position = match self {
            DevicePosition::Fixed(position) => *position,
            DevicePosition::Http(source) => {
                let payload: PositionPayload = source.http.get_json(source.url.clone()).await?;
                payload.into()
            }
        };

        info!(
            latitude = position.latitude,
            longitude = position.longitude,
            "current position"
        );

        checked(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_payloads() -> Result<(), anyhow::Error> {
        let geolocation: PositionPayload = serde_json::from_str(
            r#"{"coords": {"latitude": 33.7756, "longitude": -84.3963, "accuracy": 20}, "timestamp": 1}"#,
        )?;
        let bare: PositionPayload =
            serde_json::from_str(r#"{"latitude": 33.7756, "longitude": -84.3963}"#)?;

        assert_eq!(Position::from(geolocation), Position::new(33.7756, -84.3963));
        assert_eq!(Position::from(bare), Position::new(33.7756, -84.3963));

        Ok(())
    }

    #[tokio::test]
    async fn test_fixed_position() -> Result<(), anyhow::Error> {
        let source = DevicePosition::Fixed(Position::new(33.7756, -84.3963));

        assert_eq!(
            source.current_position().await?,
            Position::new(33.7756, -84.3963)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_position() {
        let source = DevicePosition::Fixed(Position::new(133.7756, -84.3963));

        assert!(matches!(
            source.current_position().await,
            Err(PositionError::OutOfRange { .. })
        ));
    }
}
