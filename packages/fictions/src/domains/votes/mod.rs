//! Votes domain - supports citizens give to published fictions.

pub mod actions;
pub mod models;

pub use models::{Endorsement, Vote};
