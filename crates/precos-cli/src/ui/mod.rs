mod app;
mod render;

pub use app::{App, Focus, Screen};
pub use render::render;
