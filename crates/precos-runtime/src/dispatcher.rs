use crate::error::Result;
use crate::events::AppEvent;
use crate::service::DataService;
use precos_engine::{
    DebounceTask, LookupRequest, MunicipalitiesRequest, PriceFetch, RegionsRequest,
    TerritoryCommand,
};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

/// Bridges engine commands to background service calls.
///
/// Every command spawns onto the owned tokio runtime; the blocking
/// service call runs on the blocking pool and its completion is sent as
/// an [`AppEvent`] into the channel the UI loop drains. Superseding a
/// request cancels nothing here: stale completions still arrive and the
/// engine drops them by token.
pub struct Dispatcher {
    runtime: tokio::runtime::Runtime,
    service: Arc<dyn DataService>,
    tx: Sender<AppEvent>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn DataService>) -> Result<(Self, Receiver<AppEvent>)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (tx, rx) = channel();

        Ok((
            Self {
                runtime,
                service,
                tx,
            },
            rx,
        ))
    }

    /// Sleep out the debounce window, then report the elapse. The engine
    /// ignores elapses whose generation has been superseded.
    pub fn schedule_debounce(&self, task: DebounceTask) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(task.delay_ms)).await;
            let _ = tx.send(AppEvent::DebounceElapsed {
                generation: task.generation,
            });
        });
    }

    pub fn lookup_products(&self, request: LookupRequest) {
        let LookupRequest { token, term } = request;
        let service = Arc::clone(&self.service);
        self.spawn_fetch(
            move || service.search_products(&term).map_err(|e| e.to_string()),
            move |result| AppEvent::ProductsResolved { token, result },
        );
    }

    pub fn fetch_regions(&self, request: RegionsRequest) {
        let service = Arc::clone(&self.service);
        self.spawn_fetch(
            move || service.get_regions().map_err(|e| e.to_string()),
            move |result| AppEvent::RegionsResolved {
                token: request.token,
                result,
            },
        );
    }

    pub fn fetch_municipalities(&self, request: MunicipalitiesRequest) {
        let MunicipalitiesRequest { token, region } = request;
        let service = Arc::clone(&self.service);
        self.spawn_fetch(
            move || {
                service
                    .get_municipalities(region.as_ref())
                    .map_err(|e| e.to_string())
            },
            move |result| AppEvent::MunicipalitiesResolved { token, result },
        );
    }

    pub fn fetch_prices(&self, fetch: PriceFetch) {
        let query = fetch.query;
        let service = Arc::clone(&self.service);
        let keyed = query.clone();
        self.spawn_fetch(
            move || service.get_price_history(&query).map_err(|e| e.to_string()),
            move |result| AppEvent::PricesResolved {
                query: keyed,
                result,
            },
        );
    }

    /// Run every fetch the territory selector asked for.
    pub fn execute(&self, commands: Vec<TerritoryCommand>) {
        for command in commands {
            match command {
                TerritoryCommand::FetchRegions(request) => self.fetch_regions(request),
                TerritoryCommand::FetchMunicipalities(request) => {
                    self.fetch_municipalities(request)
                }
            }
        }
    }

    fn spawn_fetch<T, F, E>(&self, call: F, event: E)
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, String> + Send + 'static,
        E: FnOnce(std::result::Result<T, String>) -> AppEvent + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = match tokio::task::spawn_blocking(call).await {
                Ok(result) => result,
                Err(join_error) => Err(join_error.to_string()),
            };
            let _ = tx.send(event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureService;
    use precos_engine::{ProductSearch, TerritorySelector};
    use precos_types::TerritoryType;

    const WAIT: Duration = Duration::from_secs(5);

    fn dispatcher() -> (Dispatcher, Receiver<AppEvent>) {
        Dispatcher::new(Arc::new(FixtureService::sample())).unwrap()
    }

    #[test]
    fn test_debounce_elapse_is_delivered() {
        let (dispatcher, rx) = dispatcher();
        dispatcher.schedule_debounce(DebounceTask {
            generation: 7,
            delay_ms: 1,
        });

        let event = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(event, AppEvent::DebounceElapsed { generation: 7 });
    }

    #[test]
    fn test_product_lookup_resolves_against_the_fixture() {
        let (dispatcher, rx) = dispatcher();
        let mut search = ProductSearch::new();
        let task = search.edit("caneta").debounce.unwrap();
        let request = search.debounce_elapsed(task.generation).unwrap();
        let token = request.token;

        dispatcher.lookup_products(request);

        match rx.recv_timeout(WAIT).unwrap() {
            AppEvent::ProductsResolved { token: t, result } => {
                assert_eq!(t, token);
                assert_eq!(result.unwrap().len(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_territory_commands_fan_out_to_both_fetches() {
        let (dispatcher, rx) = dispatcher();
        let mut selector = TerritorySelector::new();

        dispatcher.execute(selector.set_mode(TerritoryType::MunicipalitySet));

        let mut regions = None;
        let mut municipalities = None;
        for _ in 0..2 {
            match rx.recv_timeout(WAIT).unwrap() {
                AppEvent::RegionsResolved { result, .. } => regions = Some(result.unwrap()),
                AppEvent::MunicipalitiesResolved { result, .. } => {
                    municipalities = Some(result.unwrap())
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }

        assert_eq!(regions.unwrap().len(), 3);
        assert_eq!(municipalities.unwrap().len(), 4);
    }
}
