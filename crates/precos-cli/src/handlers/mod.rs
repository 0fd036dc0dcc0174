pub mod history;
pub mod products;
pub mod query;
pub mod territories;
