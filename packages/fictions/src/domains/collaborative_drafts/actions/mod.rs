mod access;
mod drafts;

pub use access::{accept_access_request, reject_access_request, request_access};
pub use drafts::{create_draft, edit_draft, publish_draft, withdraw_draft, DraftInput};
