//! Components domain - the host component and its step settings.

pub mod actions;
pub mod events;
pub mod models;

pub use events::settings_change_events;
pub use models::{Component, ComponentSettings, StepSettings};
