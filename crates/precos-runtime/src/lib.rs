pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod fixture;
pub mod service;

pub use config::{Config, resolve_config_path};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use events::AppEvent;
pub use fixture::FixtureService;
pub use service::{DataService, ServiceError, encode_query};
