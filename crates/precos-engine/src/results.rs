use precos_types::{PriceRecord, SearchQuery};
use std::cmp::Ordering;
use std::fmt;

/// Results surface reached without a valid opaque query. Fatal for the
/// page: one notification, redirect back to query entry, no partial
/// render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError;

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parâmetros de consulta inválidos")
    }
}

impl std::error::Error for EntryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Municipality,
    UnitPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Fetch state of the active query. The last good record set is held
/// separately so it stays visible through refetches and failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// A price-history fetch keyed by the full query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFetch {
    pub query: SearchQuery,
}

/// Fetches price records for a validated query and presents them as a
/// sortable, never-mutated view with a derived export affordance.
#[derive(Debug)]
pub struct ResultsPresenter {
    query: Option<SearchQuery>,
    records: Option<Vec<PriceRecord>>,
    state: ResultsState,
    sort_key: SortKey,
    sort_dir: SortDirection,
}

impl ResultsPresenter {
    pub fn new() -> Self {
        Self {
            query: None,
            records: None,
            state: ResultsState::Idle,
            // Newest purchases first, matching the query-entry flow.
            sort_key: SortKey::Date,
            sort_dir: SortDirection::Descending,
        }
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn state(&self) -> &ResultsState {
        &self.state
    }

    pub fn sort(&self) -> (SortKey, SortDirection) {
        (self.sort_key, self.sort_dir)
    }

    /// Receive navigation state. Absent state is a contract violation
    /// ([`EntryError`]); a query equal to the active one triggers no
    /// refetch; a new query starts a fetch while the previous record
    /// set stays visible.
    pub fn navigate(
        &mut self,
        state: Option<SearchQuery>,
    ) -> Result<Option<PriceFetch>, EntryError> {
        let query = state.ok_or(EntryError)?;

        if self.query.as_ref() == Some(&query) {
            return Ok(None);
        }

        self.query = Some(query.clone());
        self.state = ResultsState::Loading;
        Ok(Some(PriceFetch { query }))
    }

    /// Apply a fetch completion. Responses are keyed by query value:
    /// anything not matching the active query is stale and discarded.
    /// Failures keep the previous good data visible.
    pub fn apply_records(
        &mut self,
        query: &SearchQuery,
        result: Result<Vec<PriceRecord>, String>,
    ) -> bool {
        if self.query.as_ref() != Some(query) {
            return false;
        }

        match result {
            Ok(records) => {
                self.records = Some(records);
                self.state = ResultsState::Loaded;
            }
            Err(message) => self.state = ResultsState::Failed(message),
        }
        true
    }

    /// Re-issue the exact same fetch after a failure.
    pub fn retry(&mut self) -> Option<PriceFetch> {
        if !matches!(self.state, ResultsState::Failed(_)) {
            return None;
        }
        let query = self.query.clone()?;
        self.state = ResultsState::Loading;
        Some(PriceFetch { query })
    }

    /// Select `key` ascending, or flip direction when it is already the
    /// active key.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.flip();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDirection::Ascending;
        }
    }

    /// Derived, recomputed view over the fetched list. The underlying
    /// records are never reordered; the sort is stable, so equal-key
    /// rows keep their fetched relative order in both directions.
    pub fn view(&self) -> Vec<&PriceRecord> {
        let mut rows: Vec<&PriceRecord> = match &self.records {
            Some(records) => records.iter().collect(),
            None => return Vec::new(),
        };

        let key = self.sort_key;
        let dir = self.sort_dir;
        rows.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Date => a.date.cmp(&b.date),
                SortKey::Municipality => a.municipality.cmp(&b.municipality),
                SortKey::UnitPrice => a
                    .unit_price
                    .partial_cmp(&b.unit_price)
                    .unwrap_or(Ordering::Equal),
            };
            match dir {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }

    /// Distinct display state: the query succeeded and matched nothing.
    pub fn is_empty_result(&self) -> bool {
        self.state == ResultsState::Loaded
            && self.records.as_ref().is_some_and(|r| r.is_empty())
    }

    /// Export parameters derived from the active query, or `None` when
    /// the affordance must be inert.
    pub fn export_params(&self) -> Option<Vec<(String, String)>> {
        self.query.as_ref().map(SearchQuery::to_params)
    }
}

impl Default for ResultsPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use precos_types::{ProductId, TerritoryScope};

    fn query_for(product: &str) -> SearchQuery {
        SearchQuery {
            product_id: ProductId::from(product),
            product_name: format!("produto {}", product),
            unit: "UN".to_string(),
            scope: TerritoryScope::Statewide,
            year: None,
        }
    }

    fn record(id: &str, day: u32, municipality: &str, price: f64) -> PriceRecord {
        PriceRecord {
            id: id.to_string(),
            product_id: ProductId::from("109001"),
            product_name: "Caneta esferográfica".to_string(),
            unit: "UN".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 3, day).unwrap(),
            municipality: municipality.to_string(),
            unit_price: price,
        }
    }

    #[test]
    fn test_missing_navigation_state_is_an_entry_error() {
        let mut presenter = ResultsPresenter::new();
        assert_eq!(presenter.navigate(None), Err(EntryError));
        assert_eq!(presenter.state(), &ResultsState::Idle);
        assert!(presenter.export_params().is_none());
    }

    #[test]
    fn test_same_query_value_does_not_refetch() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");

        assert!(presenter.navigate(Some(query.clone())).unwrap().is_some());
        presenter.apply_records(&query, Ok(vec![record("a", 1, "Contagem", 1.0)]));

        assert_eq!(presenter.navigate(Some(query)).unwrap(), None);
        assert_eq!(presenter.state(), &ResultsState::Loaded);
    }

    #[test]
    fn test_previous_records_stay_visible_during_refetch() {
        let mut presenter = ResultsPresenter::new();
        let first = query_for("1");
        presenter.navigate(Some(first.clone())).unwrap();
        presenter.apply_records(&first, Ok(vec![record("a", 1, "Contagem", 1.0)]));

        let second = query_for("2");
        presenter.navigate(Some(second.clone())).unwrap();

        assert_eq!(presenter.state(), &ResultsState::Loading);
        assert_eq!(presenter.view().len(), 1);

        // A late response for the superseded query is discarded.
        assert!(!presenter.apply_records(&first, Ok(vec![])));
        assert_eq!(presenter.view().len(), 1);

        assert!(presenter.apply_records(&second, Ok(vec![])));
        assert!(presenter.is_empty_result());
    }

    #[test]
    fn test_failure_keeps_prior_data_and_retry_reissues_same_query() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");
        presenter.navigate(Some(query.clone())).unwrap();
        presenter.apply_records(&query, Ok(vec![record("a", 1, "Contagem", 1.0)]));

        let second = query_for("2");
        presenter.navigate(Some(second.clone())).unwrap();
        presenter.apply_records(&second, Err("timeout".to_string()));

        assert!(matches!(presenter.state(), ResultsState::Failed(_)));
        assert_eq!(presenter.view().len(), 1);

        let retry = presenter.retry().unwrap();
        assert_eq!(retry.query, second);
        assert_eq!(presenter.state(), &ResultsState::Loading);
    }

    #[test]
    fn test_price_sort_descending_is_exact_reverse_of_ascending() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");
        presenter.navigate(Some(query.clone())).unwrap();
        presenter.apply_records(
            &query,
            Ok(vec![
                record("a", 1, "Contagem", 3.10),
                record("b", 2, "Uberlândia", 1.05),
                record("c", 3, "Betim", 2.47),
            ]),
        );

        presenter.toggle_sort(SortKey::UnitPrice);
        let ascending: Vec<String> = presenter.view().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ascending, vec!["b", "c", "a"]);

        presenter.toggle_sort(SortKey::UnitPrice);
        let descending: Vec<&str> = presenter.view().iter().map(|r| r.id.as_str()).collect();
        let reversed: Vec<String> = ascending.into_iter().rev().collect();
        assert_eq!(descending, reversed);
    }

    #[test]
    fn test_equal_keys_keep_fetched_order_in_both_directions() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");
        presenter.navigate(Some(query.clone())).unwrap();
        presenter.apply_records(
            &query,
            Ok(vec![
                record("a", 5, "Contagem", 2.00),
                record("b", 5, "Betim", 2.00),
                record("c", 5, "Uberlândia", 2.00),
            ]),
        );

        presenter.toggle_sort(SortKey::UnitPrice);
        let ascending: Vec<&str> = presenter.view().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ascending, vec!["a", "b", "c"]);

        presenter.toggle_sort(SortKey::UnitPrice);
        let descending: Vec<&str> = presenter.view().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(descending, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_switching_key_resets_to_ascending() {
        let mut presenter = ResultsPresenter::new();
        presenter.toggle_sort(SortKey::UnitPrice);
        presenter.toggle_sort(SortKey::UnitPrice);
        assert_eq!(
            presenter.sort(),
            (SortKey::UnitPrice, SortDirection::Descending)
        );

        presenter.toggle_sort(SortKey::Municipality);
        assert_eq!(
            presenter.sort(),
            (SortKey::Municipality, SortDirection::Ascending)
        );
    }

    #[test]
    fn test_sorting_never_mutates_the_fetched_list() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");
        presenter.navigate(Some(query.clone())).unwrap();
        presenter.apply_records(
            &query,
            Ok(vec![
                record("a", 2, "Contagem", 3.10),
                record("b", 1, "Betim", 1.05),
            ]),
        );

        presenter.toggle_sort(SortKey::Date);
        let _ = presenter.view();

        let unsorted: Vec<&str> = presenter
            .records
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(unsorted, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_result_is_distinct_from_failure() {
        let mut presenter = ResultsPresenter::new();
        let query = query_for("1");
        presenter.navigate(Some(query.clone())).unwrap();
        presenter.apply_records(&query, Ok(vec![]));

        assert!(presenter.is_empty_result());
        assert_eq!(presenter.state(), &ResultsState::Loaded);
    }
}
