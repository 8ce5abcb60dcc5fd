mod amend;
mod review;

pub use amend::{amend_fiction, EmendationInput};
pub use review::{
    accept_amendment, promote_emendation, reject_amendment, withdraw_amendment, PROMOTED,
};
