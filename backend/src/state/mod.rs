// State management module
// Shared handles passed to every request handler

pub mod app_state;

pub use app_state::AppState;
