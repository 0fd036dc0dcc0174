mod args;
mod commands;
mod format;
mod handlers;
pub mod types;
mod ui;

pub use args::{Cli, Commands};
pub use commands::run;
