//! Event responder.
//!
//! Turns one inbound chat message into karma changes and replies. Commands
//! (`}karma`, `}karmafight`) are answered without scanning; anything else is
//! scanned for tokens and every hit is applied in position order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::KarmaConfig;
use crate::karma::reconciler::KarmaReconciler;
use crate::karma::scanner::{scan, Hit};
use crate::traits::PropertyStore;
use crate::types::{canonicalize_object, KarmaCount, MessageEvent, OutboundMessage, Scope};

const KARMA_COMMAND: &str = "karma";
const KARMAFIGHT_COMMAND: &str = "karmafight";

/// A command addressed to the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// `}karma <object>`; the object is empty when none was given.
    Karma(&'a str),
    /// `}karmafight <a> <b> ...`
    KarmaFight(Vec<&'a str>),
    /// An alias that only points at the real command name.
    Redirect(&'static str),
}

/// Answers chat messages.
pub struct EventResponder {
    reconciler: KarmaReconciler,
    highlight_char: String,
    channel_prefixes: String,
}

impl EventResponder {
    /// Create a responder over the given store.
    pub fn new(store: Arc<dyn PropertyStore>, config: &KarmaConfig) -> Self {
        Self {
            reconciler: KarmaReconciler::new(store, config.property_prefix.clone()),
            highlight_char: config.highlight_char.clone(),
            channel_prefixes: config.channel_prefixes.clone(),
        }
    }

    /// The reconciler used for all karma reads and writes.
    pub fn reconciler(&self) -> &KarmaReconciler {
        &self.reconciler
    }

    /// Handle a raw event given as positional parameters
    /// `[network, origin, recipient, text, ...]`.
    ///
    /// Malformed events are logged and produce no replies.
    pub async fn handle_params(&self, params: &[String]) -> Vec<OutboundMessage> {
        match MessageEvent::from_params(params) {
            Ok(event) => self.handle_message(&event).await,
            Err(e) => {
                warn!("Discarding event: {}", e);
                Vec::new()
            }
        }
    }

    /// Handle one chat message, returning the replies to send in order.
    pub async fn handle_message(&self, event: &MessageEvent) -> Vec<OutboundMessage> {
        let target = event.reply_target(&self.channel_prefixes);
        let scope = Scope::network(&event.network);
        let reply = |text: String| OutboundMessage::new(&event.network, target, text);

        if let Some(command) = self.parse_command(&event.text) {
            info!(
                network = %event.network,
                origin = %event.origin,
                recipient = %event.recipient,
                "Received command {:?}",
                command
            );
            let text = match command {
                Command::Karma(object) => self.karma_query(&scope, object).await,
                Command::KarmaFight(objects) => self.karma_fight(&scope, &objects).await,
                Command::Redirect(to) => format!("Use '{}{}'", self.highlight_char, to),
            };
            return vec![reply(text)];
        }

        let mut replies = Vec::new();
        for hit in scan(&event.text) {
            if let Some(text) = self.apply_hit(&scope, &event.origin, &hit).await {
                replies.push(reply(text));
            }
        }
        replies
    }

    /// Recognise a command. Command names are case-sensitive and must be
    /// followed by a space or the end of the message.
    pub fn parse_command<'a>(&self, text: &'a str) -> Option<Command<'a>> {
        let rest = text.strip_prefix(self.highlight_char.as_str())?;
        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        match name {
            KARMA_COMMAND => Some(Command::Karma(args.trim())),
            KARMAFIGHT_COMMAND => Some(Command::KarmaFight(args.split_whitespace().collect())),
            "karma-fight" => Some(Command::Redirect(KARMAFIGHT_COMMAND)),
            _ => None,
        }
    }

    /// Apply one hit; returns the chat reply if the hit form is verbose.
    async fn apply_hit(&self, scope: &Scope, origin: &str, hit: &Hit) -> Option<String> {
        let outcome = self.reconciler.modify_karma(scope, &hit.object, hit.sign).await;
        if !outcome.is_clean() {
            debug!(
                object = %hit.object,
                errors = outcome.errors.len(),
                "Karma changed with storage errors"
            );
        }

        let text = format!(
            "{} {} karma of {} to {}.",
            origin,
            hit.sign.verb(),
            hit.object,
            outcome.karma
        );
        info!(
            network = %scope,
            origin = %origin,
            object = %hit.object,
            net = outcome.karma.net(),
            up = outcome.karma.up,
            down = outcome.karma.down,
            "{}",
            text
        );

        hit.extraction.is_verbose().then_some(text)
    }

    async fn karma_query(&self, scope: &Scope, object: &str) -> String {
        if object.is_empty() {
            return "What do you want to know the karma of?".to_string();
        }
        let karma = self.reconciler.get_karma(scope, object).await.karma;
        describe(object, &karma)
    }

    async fn karma_fight(&self, scope: &Scope, objects: &[&str]) -> String {
        let mut seen = Vec::new();
        let mut contenders: Vec<(&str, KarmaCount)> = Vec::new();
        for &object in objects {
            let canonical = canonicalize_object(object);
            if seen.contains(&canonical) {
                continue;
            }
            seen.push(canonical);
            let karma = self.reconciler.get_karma(scope, object).await.karma;
            contenders.push((object, karma));
        }

        match contenders.len() {
            0 => return "What should the fight be between?".to_string(),
            1 => return "What kind of fight would this be?".to_string(),
            _ => {}
        }

        let best = contenders
            .iter()
            .map(|(_, karma)| karma.net())
            .max()
            .unwrap_or_default();
        // Ties are listed with the fewest upvotes first.
        let mut winners: Vec<&(&str, KarmaCount)> = contenders
            .iter()
            .filter(|(_, karma)| karma.net() == best)
            .collect();
        winners.sort_by_key(|(_, karma)| karma.up);

        match winners.as_slice() {
            [(object, karma)] => format!("{} wins with {}", object, karma),
            _ => {
                let names: Vec<&str> = winners.iter().map(|(object, _)| *object).collect();
                format!("{} all have the same karma: {}", names.join(", "), best)
            }
        }
    }
}

/// Render the reply to a karma query.
pub fn describe(object: &str, karma: &KarmaCount) -> String {
    if karma.is_neutral() {
        format!(
            "{} has neutral karma (+{}, -{}).",
            object, karma.up, karma.down
        )
    } else {
        format!("{} has a karma of {}.", object, karma)
    }
}
