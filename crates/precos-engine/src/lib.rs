pub mod assemble;
pub mod results;
pub mod search;
pub mod territory;
pub mod token;

pub use assemble::{AssembleError, assemble};
pub use results::{EntryError, PriceFetch, ResultsPresenter, ResultsState, SortDirection, SortKey};
pub use search::{DebounceTask, EditOutcome, LookupRequest, Panel, ProductSearch};
pub use territory::{
    ListState, MunicipalitiesRequest, RegionsRequest, TerritoryCommand, TerritorySelector,
};
pub use token::{RequestToken, TokenSeq};
