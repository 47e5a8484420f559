//! Orders stops by distance to the user and groups equally distant stops into pages
use itertools::Itertools;

use crate::model::{Position, Stop};

/// Stops tied at the same distance from the user
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub distance: f64,
    pub stops: Vec<Stop>,
}

impl Page {
    /// The stop whose name heads the page
    pub fn lead(&self) -> Option<&Stop> {
        self.stops.first()
    }
}

/// Planar distance in raw degrees. Only meaningful over a campus sized area.
pub fn planar_distance(position: &Position, stop: &Stop) -> f64 {
    ((stop.latitude - position.latitude).powi(2) + (stop.longitude - position.longitude).powi(2))
        .sqrt()
}

/// Sets the distance of every stop and sorts them nearest first.
/// Equally distant stops keep their input order, stops with a NaN distance go last.
pub fn rank_stops(position: &Position, mut stops: Vec<Stop>) -> Vec<Stop> {
    for stop in stops.iter_mut() {
        stop.distance = planar_distance(position, stop);
    }

    stops.sort_by(|a, b| {
        a.distance
            .is_nan()
            .cmp(&b.distance.is_nan())
            .then(a.distance.total_cmp(&b.distance))
    });

    stops
}

/// Splits ranked stops into pages of equal distance, nearest page first.
/// Expects the output of [`rank_stops`].
pub fn arrange_pages(ranked: Vec<Stop>) -> Vec<Page> {
    let chunks = ranked.into_iter().chunk_by(|stop| stop.distance);

    chunks
        .into_iter()
        .map(|(distance, stops)| Page {
            distance,
            stops: stops.collect(),
        })
        .collect()
}
