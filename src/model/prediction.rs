use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::Stop;
use crate::utils::value_at_path;

/// Where the prediction endpoint puts the arrival times.
pub const TIMES_PATH: &str = "query.results.p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArrivalTime {
    Minutes(u64),
    Text(String),
}

impl ArrivalTime {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(match n.as_u64() {
                Some(minutes) => ArrivalTime::Minutes(minutes),
                None => ArrivalTime::Text(n.to_string()),
            }),
            Value::String(s) => Some(match s.trim().parse() {
                Ok(minutes) => ArrivalTime::Minutes(minutes),
                Err(_) => ArrivalTime::Text(s.trim().to_string()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalTime::Minutes(minutes) => write!(f, "{minutes}"),
            ArrivalTime::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub stop_id: String,
    pub stop_name: String,
    pub route_id: String,
    pub times: Vec<ArrivalTime>,
}

impl Prediction {
    pub fn from_payload(stop: &Stop, payload: &Value) -> Self {
        Prediction {
            stop_id: stop.stop_id.clone(),
            stop_name: stop.stop_name.clone(),
            route_id: stop.route_id.clone(),
            times: arrival_times(payload),
        }
    }

    pub fn times_label(&self) -> String {
        self.times.iter().join(", ")
    }
}

/// Extracts the arrival times from a prediction payload.
/// Anything that isn't where it's expected yields an empty list.
pub fn arrival_times(payload: &Value) -> Vec<ArrivalTime> {
    match value_at_path(payload, TIMES_PATH) {
        Some(Value::Array(items)) => items.iter().filter_map(ArrivalTime::from_value).collect(),
        // A single prediction comes back as a bare value instead of a list
        Some(single) => ArrivalTime::from_value(single).into_iter().collect(),
        None => Vec::new(),
    }
}
