pub mod draft;

pub use draft::{CollaborativeDraft, DraftState};
