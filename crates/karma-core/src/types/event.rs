//! Inbound chat events and outbound replies.

use serde::{Deserialize, Serialize};

use crate::error::{KarmaError, KarmaResult};

/// A chat message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub network: String,
    pub origin: String,
    pub recipient: String,
    pub text: String,
}

impl MessageEvent {
    pub fn new(
        network: impl Into<String>,
        origin: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            origin: origin.into(),
            recipient: recipient.into(),
            text: text.into(),
        }
    }

    /// Build an event from positional parameters
    /// `[network, origin, recipient, text, ...]`. Extra parameters are ignored.
    pub fn from_params(params: &[String]) -> KarmaResult<Self> {
        match params {
            [network, origin, recipient, text, ..] => Ok(Self::new(
                network.as_str(),
                origin.as_str(),
                recipient.as_str(),
                text.as_str(),
            )),
            _ => Err(KarmaError::malformed_event(format!(
                "expected at least 4 parameters, got {}",
                params.len()
            ))),
        }
    }

    /// Where replies go: the channel for channel messages, the sender for
    /// private messages.
    pub fn reply_target(&self, channel_prefixes: &str) -> &str {
        match self.recipient.chars().next() {
            Some(c) if channel_prefixes.contains(c) => &self.recipient,
            _ => &self.origin,
        }
    }
}

/// A chat message to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub network: String,
    pub target: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(
        network: impl Into<String>,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            target: target.into(),
            text: text.into(),
        }
    }
}
