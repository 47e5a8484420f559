//! The collaborators the controller pulls data from
pub mod campus_api;
pub mod http;
pub mod position;

pub use campus_api::*;
pub use http::*;
pub use position::*;

use serde_json::Value;
use std::future::Future;

use crate::model::{Position, Stop};

pub trait StopSource: Send + Sync {
    /// Every stop of every route
    fn fetch_stops(&self) -> impl Future<Output = Result<Vec<Stop>, FetchError>> + Send;
}

pub trait PredictionSource: Send + Sync {
    /// The raw prediction payload of one route at one stop
    fn fetch_prediction(
        &self,
        route_id: &str,
        stop_id: &str,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Position, PositionError>> + Send;
}
