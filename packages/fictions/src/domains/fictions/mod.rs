//! Fictions domain - citizen proposals, their answers and their history.
//!
//! Models own their SQL, actions own the rules. Presentation helpers
//! (mentions, presenter, version diffs) never write.

pub mod actions;
pub mod data;
pub mod events;
pub mod factory;
pub mod mentions;
pub mod models;
pub mod presenter;
pub mod queries;
pub mod validation;
pub mod versions;

pub use data::FictionData;
pub use events::FictionEvent;
pub use models::{Fiction, FictionState};
