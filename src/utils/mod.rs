//!
//! Utility module for the wave portal.
//!
//! Plain-text rendering helpers for the terminal front end.
/// Formatting functions for display
pub mod index;

pub use index::render_log;
