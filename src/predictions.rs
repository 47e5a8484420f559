//! Fetches the arrival predictions of every stop on a page
use futures::future::try_join_all;
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::model::{Prediction, Stop};
use crate::sources::{FetchError, PredictionSource};

/// Predictions of one page keyed by route id
pub type PagePredictions = BTreeMap<String, Prediction>;

#[derive(thiserror::Error, Debug)]
#[error("error fetching the prediction of route {route_id} at stop {stop_id}")]
pub struct PredictionError {
    pub route_id: String,
    pub stop_id: String,
    #[source]
    pub source: FetchError,
}

async fn fetch_stop_prediction<P: PredictionSource>(
    source: &P,
    stop: &Stop,
) -> Result<Prediction, PredictionError> {
    let payload = source
        .fetch_prediction(&stop.route_id, &stop.stop_id)
        .await
        .map_err(|err| PredictionError {
            route_id: stop.route_id.clone(),
            stop_id: stop.stop_id.clone(),
            source: err,
        })?;

    debug!(
        route_id = %stop.route_id,
        stop_id = %stop.stop_id,
        %payload,
        "got prediction"
    );

    Ok(Prediction::from_payload(stop, &payload))
}

/// Requests the predictions of all `stops` at once.
///
/// Succeeds only when every request succeeds, a single failure fails the whole
/// page and nothing is returned. Two stops on the same route end up in one
/// slot, the later one wins.
#[tracing::instrument(err, skip_all, fields(stops = stops.len()))]
pub async fn fetch_page_predictions<P: PredictionSource>(
    source: &P,
    stops: &[Stop],
) -> Result<PagePredictions, PredictionError> {
    let requests = stops
        .iter()
        .map(|stop| fetch_stop_prediction(source, stop))
        .collect_vec();

    let predictions: PagePredictions = try_join_all(requests)
        .await?
        .into_iter()
        .map(|prediction| (prediction.route_id.clone(), prediction))
        .collect();

    info!("got predictions for {} routes", predictions.len());

    Ok(predictions)
}
