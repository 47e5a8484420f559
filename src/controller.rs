//! Keeps track of the page the user is on and what's drawn for it
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::gestures::{Gesture, GestureSource};
use crate::model::Stop;
use crate::predictions::{PagePredictions, PredictionError, fetch_page_predictions};
use crate::ranking::{Page, arrange_pages, rank_stops};
use crate::sources::{FetchError, PositionError, PositionSource, PredictionSource, StopSource};
use crate::view::{Region, ViewSink};

#[derive(thiserror::Error, Debug)]
pub enum RefreshError {
    #[error("error fetching the stops")]
    Stops(#[source] FetchError),

    #[error("error getting the current position")]
    Position(#[source] PositionError),
}

/// Everything derived from the last refresh
#[derive(Debug, Default)]
pub struct Session {
    pub current_page: usize,
    pub pages: Vec<Page>,
    pub predictions: PagePredictions,
    /// Bumped on every refresh so older page fetches can be told apart
    epoch: u64,
}

impl Session {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    /// The stops tied for nearest
    pub fn closest(&self) -> &[Stop] {
        self.pages.first().map(|p| p.stops.as_slice()).unwrap_or_default()
    }
}

/// The outcome of a page fetch, tagged with the page it was started for
pub struct PageCompletion {
    epoch: u64,
    page: usize,
    result: Result<PagePredictions, PredictionError>,
}

pub struct PageController<S, P, L, V> {
    stops: S,
    predictions: Arc<P>,
    position: L,
    view: V,
    session: Session,
    in_flight: FuturesUnordered<BoxFuture<'static, PageCompletion>>,
}

impl<S, P, L, V> PageController<S, P, L, V>
where
    S: StopSource,
    P: PredictionSource + 'static,
    L: PositionSource,
    V: ViewSink,
{
    pub fn new(stops: S, predictions: P, position: L, view: V) -> Self {
        PageController {
            stops,
            predictions: Arc::new(predictions),
            position,
            view,
            session: Session::default(),
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Page fetches that haven't been applied yet
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Fetches stops and position, rearranges the pages and draws the first one.
    /// Always goes back to the first page. When fetching fails the old pages are
    /// dropped too, so nothing from before the refresh can be navigated to.
    pub async fn refresh(&mut self) -> Result<(), RefreshError> {
        self.session.current_page = 0;
        self.session.epoch += 1;
        self.show_loading();

        let stop_source = &self.stops;
        let position_source = &self.position;
        let fetched = tokio::try_join!(
            async move { stop_source.fetch_stops().await.map_err(RefreshError::Stops) },
            async move {
                position_source
                    .current_position()
                    .await
                    .map_err(RefreshError::Position)
            },
        );

        let (stops, position) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                self.session.pages.clear();
                self.session.predictions.clear();
                self.show_notice("Unable to refresh the bus stops");
                return Err(err);
            }
        };

        self.session.pages = arrange_pages(rank_stops(&position, stops));
        self.session.predictions.clear();

        info!(
            pages = self.session.page_count(),
            distance = self.session.pages.first().map(|p| p.distance),
            "Closest stops are {}",
            self.session.closest().iter().map(|s| &s.stop_name).join(", ")
        );

        if self.session.pages.is_empty() {
            warn!("no stops to show");
            self.show_notice("No bus stops available");
            return Ok(());
        }

        self.render_page(0);

        Ok(())
    }

    /// Starts fetching the predictions of `page`, they're drawn once [`Self::apply`] gets them.
    /// Returns false if there's no such page.
    pub fn render_page(&mut self, page: usize) -> bool {
        let Some(stops) = self.session.pages.get(page).map(|p| p.stops.clone()) else {
            warn!(page, "no such page");
            return false;
        };

        debug!(page, stops = stops.len(), "fetching page predictions");
        self.show_loading();

        let source = Arc::clone(&self.predictions);
        let epoch = self.session.epoch;
        self.in_flight.push(Box::pin(async move {
            let result = fetch_page_predictions(source.as_ref(), &stops).await;
            PageCompletion {
                epoch,
                page,
                result,
            }
        }));

        true
    }

    pub fn next(&mut self) -> bool {
        if self.session.current_page + 1 >= self.session.page_count() {
            debug!("already on the last page");
            return false;
        }

        self.session.current_page += 1;
        self.render_page(self.session.current_page)
    }

    pub fn previous(&mut self) -> bool {
        if self.session.current_page == 0 {
            debug!("already on the first page");
            return false;
        }

        self.session.current_page -= 1;
        self.render_page(self.session.current_page)
    }

    /// Draws a finished page fetch unless the user has moved on since it started
    pub fn apply(&mut self, completion: PageCompletion) {
        if completion.epoch != self.session.epoch || completion.page != self.session.current_page
        {
            debug!(
                page = completion.page,
                current_page = self.session.current_page,
                "discarding stale predictions"
            );
            return;
        }

        match completion.result {
            Ok(predictions) => {
                self.session.predictions = predictions;
                self.update_interface();
            }
            Err(err) => {
                error!("Unable to gather stop predictions: {:?}", anyhow::Error::from(err));
                self.session.predictions.clear();
                self.show_notice("Unable to gather stop predictions");
            }
        }
    }

    /// Waits for the next page fetch to finish and applies it.
    /// Returns false when nothing is in flight.
    pub async fn settle(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    pub async fn handle(&mut self, gesture: Gesture) {
        debug!(?gesture, "handling gesture");

        match gesture {
            Gesture::Refresh => {
                if let Err(err) = self.refresh().await {
                    error!("{:?}", anyhow::Error::from(err));
                }
            }
            Gesture::NextPage => {
                self.next();
            }
            Gesture::PreviousPage => {
                self.previous();
            }
            Gesture::Exit => {}
        }
    }

    /// Refreshes once, then follows gestures until an exit gesture, the end of
    /// the gestures or ctrl-c
    pub async fn run<G: GestureSource>(&mut self, gestures: &mut G) {
        self.run_until(gestures, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("couldn't listen for ctrl-c {err:?}");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Like [`Self::run`] but stops as soon as `shutdown` completes, even in the
    /// middle of a refresh
    pub async fn run_until<G, F>(&mut self, gestures: &mut G, shutdown: F)
    where
        G: GestureSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pending = Some(Gesture::Refresh);

        loop {
            if let Some(gesture) = pending.take() {
                tokio::select! {
                    _ = self.handle(gesture) => {}
                    _ = &mut shutdown => {
                        info!("Interrupted, exiting application.");
                        break;
                    }
                }
            }

            tokio::select! {
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.apply(completion);
                }
                gesture = gestures.next_gesture() => match gesture {
                    Some(Gesture::Exit) | None => {
                        info!("Exiting application.");
                        break;
                    }
                    Some(gesture) => pending = Some(gesture),
                },
                _ = &mut shutdown => {
                    info!("Interrupted, exiting application.");
                    break;
                }
            }
        }
    }

    /// Refreshes and waits for the first page to be drawn
    pub async fn run_once(&mut self) -> Result<(), RefreshError> {
        self.refresh().await?;

        while self.settle().await {}

        Ok(())
    }

    fn show_loading(&mut self) {
        self.view.show(&Region::Loading);
        self.view.hide(&Region::Messages);
        self.view.hide(&Region::Notice);
        self.view.present();
    }

    fn show_notice(&mut self, notice: &str) {
        self.view.hide(&Region::Loading);
        self.view.hide(&Region::Messages);
        self.view.set_text(&Region::Notice, notice);
        self.view.show(&Region::Notice);
        self.view.present();
    }

    fn update_interface(&mut self) {
        let Some(stop) = self.session.current().and_then(Page::lead) else {
            return;
        };
        debug!(stop_id = %stop.stop_id, "drawing page {}", self.session.current_page);

        self.view.hide(&Region::Loading);
        self.view.hide(&Region::Notice);
        self.view.show(&Region::Messages);

        if self.session.current_page == 0 {
            self.view.show(&Region::Closest);
            self.view.hide(&Region::NotClosest);
            self.view.set_text(&Region::ClosestStop, &stop.stop_name);
        } else {
            self.view.hide(&Region::Closest);
            self.view.show(&Region::NotClosest);
            self.view.set_text(&Region::NotClosestStop, &stop.stop_name);
        }

        self.view.hide(&Region::Routes);
        for (route_id, prediction) in &self.session.predictions {
            self.view.show(&Region::Route(route_id.clone()));
            self.view
                .set_text(&Region::RouteMinutes(route_id.clone()), &prediction.times_label());
        }

        self.view.present();
    }
}
