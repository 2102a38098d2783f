//! Core types for dazeus-karma.

mod event;
mod karma;
mod scope;

pub use event::*;
pub use karma::*;
pub use scope::*;
