pub mod amendment;

pub use amendment::{Amendment, AmendmentState};
