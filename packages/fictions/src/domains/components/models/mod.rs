pub mod component;

pub use component::{Component, ComponentSettings, StepSettings};
