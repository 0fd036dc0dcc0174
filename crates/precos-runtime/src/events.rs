use precos_engine::RequestToken;
use precos_types::{Municipality, PriceRecord, Product, Region, SearchQuery};

/// Completions the dispatcher forwards into the UI loop's channel.
///
/// Fetch completions carry the token (or query key) of the request they
/// answer; the engine decides whether they are still current. Service
/// failures travel as rendered messages, not as error values.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    DebounceElapsed {
        generation: u64,
    },
    ProductsResolved {
        token: RequestToken,
        result: Result<Vec<Product>, String>,
    },
    RegionsResolved {
        token: RequestToken,
        result: Result<Vec<Region>, String>,
    },
    MunicipalitiesResolved {
        token: RequestToken,
        result: Result<Vec<Municipality>, String>,
    },
    PricesResolved {
        query: SearchQuery,
        result: Result<Vec<PriceRecord>, String>,
    },
}
