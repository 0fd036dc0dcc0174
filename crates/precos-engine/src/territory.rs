use crate::token::{RequestToken, TokenSeq};
use precos_types::{
    Municipality, MunicipalityCode, Region, RegionCode, TerritorySelection, TerritoryType,
};
use std::collections::BTreeSet;

/// Lifecycle of a lazily fetched selection list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    NotLoaded,
    Loading,
    Loaded(Vec<T>),
    Failed(String),
}

impl<T> ListState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListState::Loaded(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionsRequest {
    pub token: RequestToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MunicipalitiesRequest {
    pub token: RequestToken,
    /// Single filter region scoping the list; independent of the
    /// multi-select region codes.
    pub region: Option<RegionCode>,
}

/// Fetches the selector asks the caller to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerritoryCommand {
    FetchRegions(RegionsRequest),
    FetchMunicipalities(MunicipalitiesRequest),
}

/// Three-state territory machine: whole state, region set, or
/// municipality set, with dependent lazily loaded lists.
///
/// The region list is fetched once and cached for the session; it
/// serves both as the multi-select source and as the municipality
/// filter source. Municipality fetches are token-guarded with the same
/// last-writer-wins rule as product lookup.
#[derive(Debug)]
pub struct TerritorySelector {
    mode: TerritoryType,
    regions: ListState<Region>,
    municipalities: ListState<Municipality>,
    filter_region: Option<RegionCode>,
    region_codes: BTreeSet<RegionCode>,
    municipality_codes: BTreeSet<MunicipalityCode>,
    tokens: TokenSeq,
    live_regions: Option<RequestToken>,
    live_municipalities: Option<RequestToken>,
}

impl TerritorySelector {
    pub fn new() -> Self {
        Self {
            mode: TerritoryType::Whole,
            regions: ListState::NotLoaded,
            municipalities: ListState::NotLoaded,
            filter_region: None,
            region_codes: BTreeSet::new(),
            municipality_codes: BTreeSet::new(),
            tokens: TokenSeq::new(),
            live_regions: None,
            live_municipalities: None,
        }
    }

    pub fn mode(&self) -> TerritoryType {
        self.mode
    }

    pub fn regions(&self) -> &ListState<Region> {
        &self.regions
    }

    pub fn municipalities(&self) -> &ListState<Municipality> {
        &self.municipalities
    }

    pub fn filter_region(&self) -> Option<&RegionCode> {
        self.filter_region.as_ref()
    }

    /// Current selection, emitted to the owning component after every
    /// mutation.
    pub fn snapshot(&self) -> TerritorySelection {
        TerritorySelection {
            territory_type: self.mode,
            region_codes: self.region_codes.clone(),
            municipality_codes: self.municipality_codes.clone(),
        }
    }

    /// Switch territory type. Entering `Whole` clears both code sets
    /// and fetches nothing; the scoped modes lazily fetch the lists
    /// they depend on.
    pub fn set_mode(&mut self, mode: TerritoryType) -> Vec<TerritoryCommand> {
        self.mode = mode;
        let mut commands = Vec::new();

        match mode {
            TerritoryType::Whole => {
                self.region_codes.clear();
                self.municipality_codes.clear();
            }
            TerritoryType::RegionSet => {
                if let Some(request) = self.fetch_regions_if_needed() {
                    commands.push(TerritoryCommand::FetchRegions(request));
                }
            }
            TerritoryType::MunicipalitySet => {
                // Regions double as the filter dropdown source.
                if let Some(request) = self.fetch_regions_if_needed() {
                    commands.push(TerritoryCommand::FetchRegions(request));
                }
                if matches!(self.municipalities, ListState::NotLoaded) {
                    commands.push(TerritoryCommand::FetchMunicipalities(
                        self.issue_municipalities(),
                    ));
                }
            }
        }

        commands
    }

    fn fetch_regions_if_needed(&mut self) -> Option<RegionsRequest> {
        if !matches!(self.regions, ListState::NotLoaded) {
            return None;
        }
        self.regions = ListState::Loading;
        let token = self.tokens.next();
        self.live_regions = Some(token);
        Some(RegionsRequest { token })
    }

    fn issue_municipalities(&mut self) -> MunicipalitiesRequest {
        self.municipalities = ListState::Loading;
        let token = self.tokens.next();
        self.live_municipalities = Some(token);
        MunicipalitiesRequest {
            token,
            region: self.filter_region.clone(),
        }
    }

    /// Toggle a region in the multi-select. Only codes present in the
    /// loaded region list are accepted.
    pub fn toggle_region(&mut self, code: &RegionCode) -> TerritorySelection {
        let known = self.regions.items().iter().any(|r| &r.id == code);
        if self.mode == TerritoryType::RegionSet && known {
            if !self.region_codes.remove(code) {
                self.region_codes.insert(code.clone());
            }
        }
        self.snapshot()
    }

    /// Toggle a municipality in the multi-select. Only codes present in
    /// the currently loaded municipality list are accepted, which keeps
    /// the subset invariant mechanical.
    pub fn toggle_municipality(&mut self, code: &MunicipalityCode) -> TerritorySelection {
        let known = self.municipalities.items().iter().any(|m| &m.id == code);
        if self.mode == TerritoryType::MunicipalitySet && known {
            if !self.municipality_codes.remove(code) {
                self.municipality_codes.insert(code.clone());
            }
        }
        self.snapshot()
    }

    /// Change the filter region scoping the municipality list.
    /// Re-fetches the list and clears the municipality selection
    /// entirely: ids picked under the old filter are not guaranteed
    /// valid under the new one.
    pub fn set_filter_region(
        &mut self,
        region: Option<RegionCode>,
    ) -> Option<MunicipalitiesRequest> {
        if self.filter_region == region {
            return None;
        }
        self.filter_region = region;
        self.municipality_codes.clear();
        Some(self.issue_municipalities())
    }

    /// Re-issue the failed region fetch without touching selections.
    pub fn retry_regions(&mut self) -> Option<RegionsRequest> {
        if !matches!(self.regions, ListState::Failed(_)) {
            return None;
        }
        self.regions = ListState::Loading;
        let token = self.tokens.next();
        self.live_regions = Some(token);
        Some(RegionsRequest { token })
    }

    /// Re-issue the failed municipality fetch with the same filter,
    /// without touching selections.
    pub fn retry_municipalities(&mut self) -> Option<MunicipalitiesRequest> {
        if !matches!(self.municipalities, ListState::Failed(_)) {
            return None;
        }
        Some(self.issue_municipalities())
    }

    /// Apply a region fetch completion. Stale tokens are discarded.
    pub fn apply_regions(&mut self, token: RequestToken, result: Result<Vec<Region>, String>) -> bool {
        if self.live_regions != Some(token) {
            return false;
        }
        self.live_regions = None;

        match result {
            Ok(regions) => self.regions = ListState::Loaded(regions),
            Err(message) => self.regions = ListState::Failed(message),
        }
        true
    }

    /// Apply a municipality fetch completion. Stale tokens are
    /// discarded; on success, selected codes missing from the new list
    /// are purged so the subset invariant holds at all times.
    pub fn apply_municipalities(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Municipality>, String>,
    ) -> bool {
        if self.live_municipalities != Some(token) {
            return false;
        }
        self.live_municipalities = None;

        match result {
            Ok(municipalities) => {
                let loaded: BTreeSet<&MunicipalityCode> =
                    municipalities.iter().map(|m| &m.id).collect();
                self.municipality_codes.retain(|code| loaded.contains(code));
                self.municipalities = ListState::Loaded(municipalities);
            }
            Err(message) => self.municipalities = ListState::Failed(message),
        }
        true
    }
}

impl Default for TerritorySelector {
    fn default() -> Self {
        Self::new()
    }
}
