//! In memory collaborators for the tests
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

use crate::gestures::{Gesture, GestureSource};
use crate::model::{Position, Stop};
use crate::sources::{FetchError, PositionError, PositionSource, PredictionSource, StopSource};

pub fn stop(
    route_id: &str,
    stop_id: impl Into<String>,
    stop_name: impl Into<String>,
    latitude: f64,
    longitude: f64,
) -> Stop {
    Stop::new(route_id, stop_id, stop_name, latitude, longitude)
}

/// A prediction payload shaped like the real endpoint's
pub fn times(times: &[&str]) -> Value {
    json!({"query": {"count": times.len(), "results": {"p": times}}})
}

fn server_error(url: String) -> FetchError {
    FetchError::BadStatus {
        url,
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub struct StaticStops {
    stops: Vec<Stop>,
    available: Arc<AtomicBool>,
    gate: Option<Arc<Barrier>>,
}

impl StaticStops {
    pub fn new(stops: Vec<Stop>) -> Self {
        StaticStops {
            stops,
            available: Arc::new(AtomicBool::new(true)),
            gate: None,
        }
    }

    pub fn unavailable() -> Self {
        let stops = StaticStops::new(vec![]);
        stops.available.store(false, Ordering::SeqCst);
        stops
    }

    /// Waits on `barrier` before answering
    pub fn gated(mut self, barrier: Arc<Barrier>) -> Self {
        self.gate = Some(barrier);
        self
    }

    /// Flip to false to make later fetches fail
    pub fn availability(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.available)
    }
}

impl StopSource for StaticStops {
    async fn fetch_stops(&self) -> Result<Vec<Stop>, FetchError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        if self.available.load(Ordering::SeqCst) {
            Ok(self.stops.clone())
        } else {
            Err(server_error("stops".to_string()))
        }
    }
}

pub struct StaticPosition {
    position: Option<Position>,
    gate: Option<Arc<Barrier>>,
}

impl StaticPosition {
    pub fn new(position: Position) -> Self {
        StaticPosition {
            position: Some(position),
            gate: None,
        }
    }

    pub fn unavailable() -> Self {
        StaticPosition {
            position: None,
            gate: None,
        }
    }

    /// Waits on `barrier` before answering
    pub fn gated(mut self, barrier: Arc<Barrier>) -> Self {
        self.gate = Some(barrier);
        self
    }
}

impl PositionSource for StaticPosition {
    async fn current_position(&self) -> Result<Position, PositionError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        self.position
            .ok_or_else(|| PositionError::Fetch(server_error("position".to_string())))
    }
}

type Key = (String, String);

fn key(route_id: &str, stop_id: &str) -> Key {
    (route_id.to_string(), stop_id.to_string())
}

/// Answers prediction requests from a script. Unscripted stops get a null payload.
#[derive(Default)]
pub struct ScriptedPredictions {
    payloads: HashMap<Key, Value>,
    failing: HashSet<Key>,
    delays: HashMap<Key, Duration>,
    gate: Option<Arc<Barrier>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedPredictions {
    pub fn with_payload(mut self, route_id: &str, stop_id: &str, payload: Value) -> Self {
        self.payloads.insert(key(route_id, stop_id), payload);
        self
    }

    pub fn failing(mut self, route_id: &str, stop_id: &str) -> Self {
        self.failing.insert(key(route_id, stop_id));
        self
    }

    pub fn delayed(mut self, route_id: &str, stop_id: &str, delay: Duration) -> Self {
        self.delays.insert(key(route_id, stop_id), delay);
        self
    }

    /// Every request waits on `barrier` before answering
    pub fn gated(mut self, barrier: Arc<Barrier>) -> Self {
        self.gate = Some(barrier);
        self
    }

    /// Number of requests made so far
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PredictionSource for ScriptedPredictions {
    async fn fetch_prediction(&self, route_id: &str, stop_id: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = key(route_id, stop_id);

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&key) {
            return Err(server_error(format!("{route_id}/{stop_id}")));
        }

        Ok(self.payloads.get(&key).cloned().unwrap_or(Value::Null))
    }
}

pub struct ScriptedGestures(pub VecDeque<Gesture>);

impl ScriptedGestures {
    pub fn new(gestures: impl IntoIterator<Item = Gesture>) -> Self {
        ScriptedGestures(gestures.into_iter().collect())
    }
}

impl GestureSource for ScriptedGestures {
    async fn next_gesture(&mut self) -> Option<Gesture> {
        self.0.pop_front()
    }
}
