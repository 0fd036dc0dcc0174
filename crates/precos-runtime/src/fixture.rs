use crate::error::{Error, Result};
use crate::service::{DataService, ServiceError, encode_query};
use chrono::{Datelike, NaiveDate};
use precos_types::{
    Municipality, MunicipalityCode, PriceRecord, Product, ProductId, Region, RegionCode,
    SearchQuery, TerritoryScope,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A price record as stored in the fixture dataset. Carries the
/// municipality code alongside the display record so territorial
/// filtering does not depend on name matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    municipality_id: MunicipalityCode,
    #[serde(flatten)]
    record: PriceRecord,
}

/// In-memory [`DataService`] backed by a canned dataset.
///
/// Used as the default service of the CLI and in tests. The dataset can
/// be the built-in sample or loaded from a directory of JSON files
/// (`products.json`, `regions.json`, `municipalities.json`,
/// `prices.json`).
pub struct FixtureService {
    products: Vec<Product>,
    regions: Vec<Region>,
    municipalities: Vec<Municipality>,
    records: Vec<StoredRecord>,
    export_base: String,
}

impl FixtureService {
    /// The built-in sample: office supplies priced across four
    /// municipalities of Minas Gerais.
    pub fn sample() -> Self {
        let products = vec![
            product("109001", "Caneta esferográfica", "UN"),
            product("109002", "Caneta gel", "UN"),
            product("204400", "Papel A4", "RESMA"),
        ];
        let regions = vec![
            region("R01", "Central"),
            region("R02", "Zona da Mata"),
            region("R03", "Triângulo Mineiro"),
        ];
        let municipalities = vec![
            municipality("3106200", "Belo Horizonte", "R01"),
            municipality("3118601", "Contagem", "R01"),
            municipality("3136702", "Juiz de Fora", "R02"),
            municipality("3170206", "Uberlândia", "R03"),
        ];
        let records = vec![
            stored("P-0001", &products[0], 2021, 3, 15, "3106200", "Belo Horizonte", 1.85),
            stored("P-0002", &products[0], 2021, 11, 2, "3118601", "Contagem", 1.60),
            stored("P-0003", &products[0], 2022, 5, 20, "3106200", "Belo Horizonte", 2.10),
            stored("P-0004", &products[0], 2022, 8, 9, "3170206", "Uberlândia", 1.95),
            stored("P-0005", &products[0], 2023, 2, 27, "3136702", "Juiz de Fora", 2.40),
            stored("P-0006", &products[1], 2022, 6, 14, "3106200", "Belo Horizonte", 3.75),
            stored("P-0007", &products[1], 2023, 9, 1, "3170206", "Uberlândia", 4.10),
            stored("P-0008", &products[2], 2022, 4, 5, "3106200", "Belo Horizonte", 24.90),
            stored("P-0009", &products[2], 2023, 10, 18, "3118601", "Contagem", 27.50),
        ];

        Self {
            products,
            regions,
            municipalities,
            records,
            export_base: "http://localhost:8000".to_string(),
        }
    }

    /// Load a dataset from a directory of JSON files.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            products: load_json(&dir.join("products.json"))?,
            regions: load_json(&dir.join("regions.json"))?,
            municipalities: load_json(&dir.join("municipalities.json"))?,
            records: load_json(&dir.join("prices.json"))?,
            export_base: "http://localhost:8000".to_string(),
        })
    }

    pub fn with_export_base(mut self, base: impl Into<String>) -> Self {
        self.export_base = base.into();
        self
    }

    fn region_of(&self, municipality_id: &MunicipalityCode) -> Option<&RegionCode> {
        self.municipalities
            .iter()
            .find(|m| &m.id == municipality_id)
            .and_then(|m| m.region_id.as_ref())
    }

    fn matches_scope(&self, stored: &StoredRecord, scope: &TerritoryScope) -> bool {
        match scope {
            TerritoryScope::Statewide => true,
            TerritoryScope::Regions { region_codes } => self
                .region_of(&stored.municipality_id)
                .is_some_and(|r| region_codes.contains(r)),
            TerritoryScope::Municipalities { municipality_codes } => {
                municipality_codes.contains(&stored.municipality_id)
            }
        }
    }
}

impl DataService for FixtureService {
    fn search_products(&self, term: &str) -> std::result::Result<Vec<Product>, ServiceError> {
        let needle = term.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn get_product(&self, id: &ProductId) -> std::result::Result<Product, ServiceError> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("produto {}", id)))
    }

    fn get_regions(&self) -> std::result::Result<Vec<Region>, ServiceError> {
        Ok(self.regions.clone())
    }

    fn get_municipalities(
        &self,
        region: Option<&RegionCode>,
    ) -> std::result::Result<Vec<Municipality>, ServiceError> {
        Ok(self
            .municipalities
            .iter()
            .filter(|m| region.is_none() || m.region_id.as_ref() == region)
            .cloned()
            .collect())
    }

    fn get_price_history(&self, query: &SearchQuery) -> std::result::Result<Vec<PriceRecord>, ServiceError> {
        Ok(self
            .records
            .iter()
            .filter(|s| s.record.product_id == query.product_id)
            .filter(|s| self.matches_scope(s, &query.scope))
            .filter(|s| query.year.is_none_or(|y| s.record.date.year() == y))
            .map(|s| s.record.clone())
            .collect())
    }

    fn export_url(&self, query: &SearchQuery) -> String {
        encode_query(&self.export_base, query)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Dataset(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

fn product(id: &str, name: &str, unit: &str) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_string(),
        unit: unit.to_string(),
    }
}

fn region(id: &str, name: &str) -> Region {
    Region {
        id: RegionCode::from(id),
        name: name.to_string(),
    }
}

fn municipality(id: &str, name: &str, region: &str) -> Municipality {
    Municipality {
        id: MunicipalityCode::from(id),
        name: name.to_string(),
        region_id: Some(RegionCode::from(region)),
    }
}

#[allow(clippy::too_many_arguments)]
fn stored(
    id: &str,
    product: &Product,
    year: i32,
    month: u32,
    day: u32,
    municipality_id: &str,
    municipality: &str,
    unit_price: f64,
) -> StoredRecord {
    // Sample dates are fixed literals; default keeps construction infallible.
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();
    StoredRecord {
        municipality_id: MunicipalityCode::from(municipality_id),
        record: PriceRecord {
            id: id.to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit: product.unit.clone(),
            date,
            municipality: municipality.to_string(),
            unit_price,
        },
    }
}
