//! karma-dazeus - DaZeus core connection for dazeus-karma.
//!
//! Speaks the DaZeus plugin protocol over a unix or TCP socket: handshake,
//! event subscription, outbound chat messages and the property API. The
//! client doubles as a [`karma_core::PropertyStore`], so karma can be kept
//! in the core's own database.
//!
//! # Example
//!
//! ```ignore
//! use karma_dazeus::{DaZeusClient, Endpoint, PRIVMSG};
//!
//! let endpoint: Endpoint = "unix:/tmp/dazeus.sock".parse()?;
//! let client = DaZeusClient::connect(&endpoint).await?;
//! client.handshake("dazeus-karma", "0.1.1", None).await?;
//! client.subscribe(&[PRIVMSG]).await?;
//!
//! let event = client.next_event().await?;
//! ```

mod client;
mod codec;
mod endpoint;
mod protocol;
mod store;

pub use client::DaZeusClient;
pub use codec::{DaZeusCodec, MAX_FRAME_LENGTH};
pub use endpoint::{Endpoint, Transport};
pub use protocol::{Event, PRIVMSG, PROTOCOL_VERSION};
