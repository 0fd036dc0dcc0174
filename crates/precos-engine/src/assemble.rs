use precos_types::{Product, SearchQuery, TerritoryScope, TerritorySelection, TerritoryType};
use std::fmt;

/// Validation failure while assembling a query. Shown to the user as a
/// transient message; nothing navigates and no state is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    NoProduct,
    NoRegions,
    NoMunicipalities,
    BadYear(String),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::NoProduct => write!(f, "Selecione um produto para continuar"),
            AssembleError::NoRegions => write!(f, "Selecione pelo menos uma região"),
            AssembleError::NoMunicipalities => write!(f, "Selecione pelo menos um município"),
            AssembleError::BadYear(value) => write!(f, "Ano inválido: {}", value),
        }
    }
}

impl std::error::Error for AssembleError {}

/// Combine the current product, territory selection, and year field
/// into an immutable [`SearchQuery`], or reject with the first failing
/// validation (errors are not aggregated).
///
/// The year is a display hint: any integer is accepted, empty means
/// "all years", and anything unparseable is rejected.
pub fn assemble(
    product: Option<&Product>,
    selection: &TerritorySelection,
    year: &str,
) -> Result<SearchQuery, AssembleError> {
    let product = product.ok_or(AssembleError::NoProduct)?;

    let scope = match selection.territory_type {
        TerritoryType::Whole => TerritoryScope::Statewide,
        TerritoryType::RegionSet => {
            if selection.region_codes.is_empty() {
                return Err(AssembleError::NoRegions);
            }
            TerritoryScope::Regions {
                region_codes: selection.region_codes.clone(),
            }
        }
        TerritoryType::MunicipalitySet => {
            if selection.municipality_codes.is_empty() {
                return Err(AssembleError::NoMunicipalities);
            }
            TerritoryScope::Municipalities {
                municipality_codes: selection.municipality_codes.clone(),
            }
        }
    };

    let year = match year.trim() {
        "" => None,
        value => Some(
            value
                .parse::<i32>()
                .map_err(|_| AssembleError::BadYear(value.to_string()))?,
        ),
    };

    Ok(SearchQuery {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        unit: product.unit.clone(),
        scope,
        year,
    })
}
