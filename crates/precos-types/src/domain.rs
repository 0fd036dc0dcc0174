use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Product identifier as assigned by the price database
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Planning-region code (groups of municipalities)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RegionCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RegionCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Municipality code (IBGE seven-digit identifier)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MunicipalityCode(String);

impl MunicipalityCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MunicipalityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MunicipalityCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MunicipalityCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A product as returned by the lookup service. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionCode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: MunicipalityCode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RegionCode>,
}

/// Territorial limit of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerritoryType {
    /// The whole state
    #[serde(rename = "ESTADO")]
    Whole,
    /// One or more planning regions
    #[serde(rename = "REGIAO")]
    RegionSet,
    /// One or more municipalities
    #[serde(rename = "MUNICIPIO")]
    MunicipalitySet,
}

impl TerritoryType {
    /// Wire name used by the price API
    pub fn as_wire(&self) -> &'static str {
        match self {
            TerritoryType::Whole => "ESTADO",
            TerritoryType::RegionSet => "REGIAO",
            TerritoryType::MunicipalitySet => "MUNICIPIO",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "ESTADO" => Some(TerritoryType::Whole),
            "REGIAO" => Some(TerritoryType::RegionSet),
            "MUNICIPIO" => Some(TerritoryType::MunicipalitySet),
            _ => None,
        }
    }
}

impl fmt::Display for TerritoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Mutable multi-select state owned by the territory selector.
///
/// Invariants: `Whole` keeps both sets empty; `MunicipalitySet` keeps
/// `municipality_codes` a subset of the currently loaded municipality
/// list (the selector purges codes when the loaded list changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritorySelection {
    pub territory_type: TerritoryType,
    pub region_codes: BTreeSet<RegionCode>,
    pub municipality_codes: BTreeSet<MunicipalityCode>,
}

impl TerritorySelection {
    /// The initial selection: whole state, nothing picked.
    pub fn whole() -> Self {
        Self {
            territory_type: TerritoryType::Whole,
            region_codes: BTreeSet::new(),
            municipality_codes: BTreeSet::new(),
        }
    }
}

impl Default for TerritorySelection {
    fn default() -> Self {
        Self::whole()
    }
}

/// One observed purchase-price entry. Read-only; the result set is
/// replaced wholesale on each new query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    pub date: NaiveDate,
    pub municipality: String,
    pub unit_price: f64,
}
