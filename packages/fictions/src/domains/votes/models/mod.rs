pub mod endorsement;
pub mod vote;

pub use endorsement::Endorsement;
pub use vote::Vote;
