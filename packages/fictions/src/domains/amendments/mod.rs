//! Amendments domain - emendations proposing a new text for a fiction.
//!
//! An emendation is itself a fiction; the amendment ties it to the fiction
//! it amends and tracks whether the amendable's authors took it.

pub mod actions;
pub mod models;

pub use models::{Amendment, AmendmentState};
