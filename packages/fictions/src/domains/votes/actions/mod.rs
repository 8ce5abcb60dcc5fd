mod endorsing;
mod voting;

pub use endorsing::{endorse_fiction, unendorse_fiction};
pub use voting::{unvote_fiction, vote_fiction};
