//! Collaborative drafts domain - texts written together before they become
//! a fiction.

pub mod actions;
pub mod models;

pub use models::{CollaborativeDraft, DraftState};
