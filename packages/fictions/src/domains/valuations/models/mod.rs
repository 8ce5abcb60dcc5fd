pub mod note;
pub mod valuator_role;

pub use note::Note;
pub use valuator_role::{ValuationAssignment, ValuatorRole};
