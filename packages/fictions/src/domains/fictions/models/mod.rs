pub mod attachment;
pub mod coauthorship;
pub mod fiction;
pub mod version;

pub use attachment::{Attachment, NewAttachment};
pub use coauthorship::{Author, Coauthorship};
pub use fiction::{Fiction, FictionState, NewFiction, COPIED_FROM_COMPONENT};
pub use version::{Changeset, NewVersion, Version, VersionEvent};
