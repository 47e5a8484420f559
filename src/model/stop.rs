use serde::{Deserialize, Deserializer, Serialize, de};

/// A stop as listed by the stop endpoint, e.g.
/// `{"route_id":"blue","stop_id":"fitthall_a","stop_name":"Fitten Hall","stop_lat":"33.778274","stop_lon":"-84.404191"}`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StopRecord {
    pub route_id: String,
    pub stop_id: String,
    pub stop_name: String,
    /// The API sends coordinates as strings, numbers are accepted too
    #[serde(deserialize_with = "f64_from_str_or_number")]
    pub stop_lat: f64,
    #[serde(deserialize_with = "f64_from_str_or_number")]
    pub stop_lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub route_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Distance to the last known position in degrees.
    /// Recomputed on every refresh, zero until then.
    pub distance: f64,
}

impl Stop {
    pub fn new(
        route_id: impl Into<String>,
        stop_id: impl Into<String>,
        stop_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Stop {
            stop_id: stop_id.into(),
            stop_name: stop_name.into(),
            route_id: route_id.into(),
            latitude,
            longitude,
            distance: 0.0,
        }
    }
}

impl From<StopRecord> for Stop {
    fn from(value: StopRecord) -> Self {
        Stop::new(
            value.route_id,
            value.stop_id,
            value.stop_name,
            value.stop_lat,
            value.stop_lon,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNumber {
    Number(f64),
    Str(String),
}

fn f64_from_str_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let coordinate: f64 = match StrOrNumber::deserialize(deserializer)? {
        StrOrNumber::Number(n) => n,
        StrOrNumber::Str(s) => s.trim().parse().map_err(de::Error::custom)?,
    };

    if coordinate.is_finite() {
        Ok(coordinate)
    } else {
        Err(de::Error::custom(format!("coordinate {coordinate} isn't finite")))
    }
}
