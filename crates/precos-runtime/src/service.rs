use precos_types::{Municipality, PriceRecord, Product, ProductId, Region, RegionCode, SearchQuery};
use std::fmt;

/// Failure surfaced by a data-service call. The engine only ever sees
/// the rendered message; the variants exist for the CLI handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    NotFound(String),
    Unavailable(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(what) => write!(f, "não encontrado: {}", what),
            ServiceError::Unavailable(msg) => write!(f, "serviço indisponível: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Consumed interface to the price database.
///
/// Calls are blocking; the dispatcher runs them on background tasks.
/// Timeouts belong to the implementation, not to the callers.
pub trait DataService: Send + Sync {
    /// Free-text product lookup. May return an empty, unordered list.
    fn search_products(&self, term: &str) -> Result<Vec<Product>, ServiceError>;

    /// Single product by id.
    fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError>;

    /// Planning regions. Stable for a session; callers cache it.
    fn get_regions(&self) -> Result<Vec<Region>, ServiceError>;

    /// Municipalities, optionally scoped to one region.
    fn get_municipalities(
        &self,
        region: Option<&RegionCode>,
    ) -> Result<Vec<Municipality>, ServiceError>;

    /// Price records matching the query. Empty is a valid answer.
    fn get_price_history(&self, query: &SearchQuery) -> Result<Vec<PriceRecord>, ServiceError>;

    /// Export URL for the query. Pure; no request is made.
    fn export_url(&self, query: &SearchQuery) -> String;
}

/// Serialize a query into the export endpoint URL. Array-valued fields
/// repeat the parameter name; values are percent-encoded.
pub fn encode_query(base_url: &str, query: &SearchQuery) -> String {
    let pairs: Vec<String> = query
        .to_params()
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect();

    format!(
        "{}/api/prices/export?{}",
        base_url.trim_end_matches('/'),
        pairs.join("&")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use precos_types::{MunicipalityCode, TerritoryScope};

    fn query() -> SearchQuery {
        SearchQuery {
            product_id: ProductId::from("109001"),
            product_name: "Caneta esferográfica".to_string(),
            unit: "UN".to_string(),
            scope: TerritoryScope::Municipalities {
                municipality_codes: ["3106200", "3170206"]
                    .into_iter()
                    .map(MunicipalityCode::from)
                    .collect(),
            },
            year: Some(2022),
        }
    }

    #[test]
    fn test_encode_query_escapes_and_repeats_array_params() {
        let url = encode_query("http://localhost:8000", &query());

        assert!(url.starts_with("http://localhost:8000/api/prices/export?"));
        assert!(url.contains("product_name=Caneta%20esferogr%C3%A1fica"));
        assert!(url.contains("municipality_codes=3106200&municipality_codes=3170206"));
        assert!(url.contains("territory_type=MUNICIPIO"));
        assert!(url.contains("year=2022"));
    }

    #[test]
    fn test_encode_query_tolerates_trailing_slash_in_base() {
        let with = encode_query("http://localhost:8000/", &query());
        let without = encode_query("http://localhost:8000", &query());
        assert_eq!(with, without);
    }
}
