//! Valuations domain - private notes and valuator assignments.
//!
//! Valuators hold a role per space and only see the fictions assigned to
//! that role.

pub mod actions;
pub mod models;

pub use models::{Note, ValuationAssignment, ValuatorRole};
