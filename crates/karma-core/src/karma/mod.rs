//! The karma engine: token scanning, counter reconciliation and replies.

pub mod reconciler;
pub mod responder;
pub mod scanner;

pub use reconciler::{reconcile, KarmaOutcome, KarmaReconciler};
pub use responder::{describe, Command, EventResponder};
pub use scanner::{scan, Bracket, Extraction, Hit, Token};
