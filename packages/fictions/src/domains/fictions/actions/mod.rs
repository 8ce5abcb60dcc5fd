//! Fiction actions - business logic called from the HTTP routes.
//!
//! Every action takes the acting user and the dependency container, checks
//! the evaluator before touching anything, and returns the saved record.

mod answers;
mod bulk;
mod lifecycle;
mod official;
pub mod support;

pub use answers::{answer_fiction, publish_answers};
pub use bulk::{
    export_fictions, import_fictions, merge_fictions, split_fictions, update_category,
    update_scope,
};
pub(crate) use lifecycle::{ensure_below_fiction_limit, notify_mentions};
pub use lifecycle::{create_fiction, edit_fiction, publish_fiction, withdraw_fiction};
pub use official::{create_official_fiction, edit_official_fiction};
