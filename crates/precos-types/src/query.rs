use crate::domain::{MunicipalityCode, ProductId, RegionCode, TerritoryType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Territorial scope of a search query.
///
/// Discriminated by territory type so each variant carries exactly the
/// codes valid for it; the assembler cannot produce a region-scoped
/// query without regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "territory_type")]
pub enum TerritoryScope {
    #[serde(rename = "ESTADO")]
    Statewide,
    #[serde(rename = "REGIAO")]
    Regions { region_codes: BTreeSet<RegionCode> },
    #[serde(rename = "MUNICIPIO")]
    Municipalities {
        municipality_codes: BTreeSet<MunicipalityCode>,
    },
}

impl TerritoryScope {
    pub fn territory_type(&self) -> TerritoryType {
        match self {
            TerritoryScope::Statewide => TerritoryType::Whole,
            TerritoryScope::Regions { .. } => TerritoryType::RegionSet,
            TerritoryScope::Municipalities { .. } => TerritoryType::MunicipalitySet,
        }
    }
}

/// The immutable, validated description of what to fetch.
///
/// Built once per submission by the assembler and never mutated after;
/// value equality is the fetch/cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    #[serde(flatten)]
    pub scope: TerritoryScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl SearchQuery {
    pub fn territory_type(&self) -> TerritoryType {
        self.scope.territory_type()
    }

    /// Serialize into query-string pairs in the shape the export
    /// endpoint expects. Array-valued fields repeat the parameter name;
    /// absent fields are omitted.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("product_id".to_string(), self.product_id.to_string()),
            ("product_name".to_string(), self.product_name.clone()),
            ("unit".to_string(), self.unit.clone()),
            (
                "territory_type".to_string(),
                self.territory_type().as_wire().to_string(),
            ),
        ];

        match &self.scope {
            TerritoryScope::Statewide => {}
            TerritoryScope::Regions { region_codes } => {
                for code in region_codes {
                    params.push(("region_codes".to_string(), code.to_string()));
                }
            }
            TerritoryScope::Municipalities { municipality_codes } => {
                for code in municipality_codes {
                    params.push(("municipality_codes".to_string(), code.to_string()));
                }
            }
        }

        if let Some(year) = self.year {
            params.push(("year".to_string(), year.to_string()));
        }

        params
    }

    /// Rebuild a query from parsed query-string pairs.
    ///
    /// Inverse of [`to_params`](Self::to_params) up to value equality;
    /// pair order is irrelevant.
    pub fn from_params<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut product_id = None;
        let mut product_name = None;
        let mut unit = None;
        let mut territory_type = None;
        let mut region_codes = BTreeSet::new();
        let mut municipality_codes = BTreeSet::new();
        let mut year = None;

        for (name, value) in pairs {
            match name {
                "product_id" => product_id = Some(ProductId::from(value)),
                "product_name" => product_name = Some(value.to_string()),
                "unit" => unit = Some(value.to_string()),
                "territory_type" => {
                    territory_type = Some(
                        TerritoryType::from_wire(value)
                            .ok_or_else(|| Error::UnknownTerritoryType(value.to_string()))?,
                    );
                }
                "region_codes" => {
                    region_codes.insert(RegionCode::from(value));
                }
                "municipality_codes" => {
                    municipality_codes.insert(MunicipalityCode::from(value));
                }
                "year" => {
                    year = Some(value.parse::<i32>().map_err(|_| Error::InvalidParam {
                        name: "year",
                        value: value.to_string(),
                    })?);
                }
                _ => {}
            }
        }

        let scope = match territory_type.ok_or(Error::MissingParam("territory_type"))? {
            TerritoryType::Whole => TerritoryScope::Statewide,
            TerritoryType::RegionSet => {
                if region_codes.is_empty() {
                    return Err(Error::EmptyCodes("region_codes"));
                }
                TerritoryScope::Regions { region_codes }
            }
            TerritoryType::MunicipalitySet => {
                if municipality_codes.is_empty() {
                    return Err(Error::EmptyCodes("municipality_codes"));
                }
                TerritoryScope::Municipalities { municipality_codes }
            }
        };

        Ok(SearchQuery {
            product_id: product_id.ok_or(Error::MissingParam("product_id"))?,
            product_name: product_name.ok_or(Error::MissingParam("product_name"))?,
            unit: unit.ok_or(Error::MissingParam("unit"))?,
            scope,
            year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn municipal_query() -> SearchQuery {
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
            year: None,
        }
    }

    #[test]
    fn test_params_omit_absent_fields() {
        let params = municipal_query().to_params();

        assert!(params.iter().all(|(k, _)| k != "year"));
        assert!(params.iter().all(|(k, _)| k != "region_codes"));

        let codes: Vec<_> = params
            .iter()
            .filter(|(k, _)| k == "municipality_codes")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(codes, vec!["3106200", "3170206"]);
    }

    #[test]
    fn test_params_round_trip_municipalities() {
        let query = municipal_query();
        let params = query.to_params();
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        assert_eq!(SearchQuery::from_params(pairs).unwrap(), query);
    }

    #[test]
    fn test_params_round_trip_multiple_regions_with_year() {
        let query = SearchQuery {
            product_id: ProductId::from("204400"),
            product_name: "Papel A4".to_string(),
            unit: "RESMA".to_string(),
            scope: TerritoryScope::Regions {
                region_codes: ["R01", "R03", "R05"]
                    .into_iter()
                    .map(RegionCode::from)
                    .collect(),
            },
            year: Some(2022),
        };

        let params = query.to_params();
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        assert_eq!(SearchQuery::from_params(pairs).unwrap(), query);
    }

    #[test]
    fn test_from_params_rejects_region_set_without_codes() {
        let pairs = vec![
            ("product_id", "1"),
            ("product_name", "x"),
            ("unit", "UN"),
            ("territory_type", "REGIAO"),
        ];

        assert_eq!(
            SearchQuery::from_params(pairs),
            Err(Error::EmptyCodes("region_codes"))
        );
    }

    #[test]
    fn test_from_params_rejects_unknown_territory_type() {
        let pairs = vec![
            ("product_id", "1"),
            ("product_name", "x"),
            ("unit", "UN"),
            ("territory_type", "PAIS"),
        ];

        assert_eq!(
            SearchQuery::from_params(pairs),
            Err(Error::UnknownTerritoryType("PAIS".to_string()))
        );
    }

    #[test]
    fn test_from_params_rejects_bad_year() {
        let pairs = vec![
            ("product_id", "1"),
            ("product_name", "x"),
            ("unit", "UN"),
            ("territory_type", "ESTADO"),
            ("year", "20x3"),
        ];

        assert!(matches!(
            SearchQuery::from_params(pairs),
            Err(Error::InvalidParam { name: "year", .. })
        ));
    }

    #[test]
    fn test_json_shape_flattens_scope_under_wire_names() {
        let value = serde_json::to_value(municipal_query()).unwrap();

        assert_eq!(value["territory_type"], "MUNICIPIO");
        assert_eq!(value["municipality_codes"][0], "3106200");
        assert_eq!(value["product_id"], "109001");
        assert!(value.get("year").is_none());
    }

    #[test]
    fn test_query_equality_ignores_code_insertion_order() {
        let a = SearchQuery {
            product_id: ProductId::from("1"),
            product_name: "x".to_string(),
            unit: "UN".to_string(),
            scope: TerritoryScope::Regions {
                region_codes: ["R02", "R01"].into_iter().map(RegionCode::from).collect(),
            },
            year: None,
        };
        let b = SearchQuery {
            product_id: ProductId::from("1"),
            product_name: "x".to_string(),
            unit: "UN".to_string(),
            scope: TerritoryScope::Regions {
                region_codes: ["R01", "R02"].into_iter().map(RegionCode::from).collect(),
            },
            year: None,
        };

        assert_eq!(a, b);
    }
}
