//! Ratatui front-end: one table screen with a search bar, a track form and a
//! delete confirmation dialog.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
