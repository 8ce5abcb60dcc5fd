// Fictions - participatory proposals component
//
// Citizens submit, amend, vote and endorse fictions; admins and valuators
// answer them. Architecture follows domain-driven design: models own their
// SQL, actions own the rules, the kernel owns infrastructure.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
