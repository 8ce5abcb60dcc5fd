mod assignments;
mod notes;

pub use assignments::{assign_valuator, unassign_valuator};
pub use notes::create_note;
