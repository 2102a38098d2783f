//! Core traits for dazeus-karma collaborators.

mod property_store;

pub use property_store::*;
