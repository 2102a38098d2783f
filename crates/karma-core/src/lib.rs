//! karma-core - Core library for dazeus-karma.
//!
//! This crate watches chat text for `object++` / `object--` tokens, keeps a
//! per-network up/down counter for every object in a property store, and
//! formats the replies the plugin sends back.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use karma_core::{EventResponder, InMemoryPropertyStore, KarmaConfig, MessageEvent};
//!
//! let store = Arc::new(InMemoryPropertyStore::new());
//! let responder = EventResponder::new(store, &KarmaConfig::default());
//!
//! let event = MessageEvent::new("oftc", "alice", "#rust", "[borrowck]++");
//! let replies = responder.handle_message(&event).await;
//! assert_eq!(replies[0].text, "alice increased karma of borrowck to 1 (+1, -0).");
//! ```

pub mod config;
pub mod error;
pub mod karma;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{KarmaConfig, LogFormat, StoreBackend, StoreConfig};
pub use error::{ErrorCode, KarmaError, KarmaResult};
pub use karma::{
    reconcile, scan, Bracket, Command, EventResponder, Extraction, Hit, KarmaOutcome,
    KarmaReconciler,
};
pub use store::{InMemoryPropertyStore, SqlitePropertyStore};
pub use traits::PropertyStore;
pub use types::{
    canonicalize_object, KarmaCount, KarmaKeys, MessageEvent, OutboundMessage, Scope, Sign,
};
