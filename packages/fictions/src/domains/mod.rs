pub mod amendments;
pub mod auth;
pub mod collaborative_drafts;
pub mod components;
pub mod fictions;
pub mod valuations;
pub mod votes;
