//! Inbound envelope classification.
//!
//! Both inbound consumers (the discovery responder and the dispatch loop)
//! apply the same gates before acting on an envelope:
//! - the envelope version must be the one we understand
//! - the kind must be `directed_privmsg`
//! - the payload must have the directed shape (a `message`)
//!
//! `sender` and `channel` are optional here; each consumer checks the one
//! it replies to.

use zenircbot_types::envelope::{DirectedMessage, Envelope, MessageKind};

/// Outcome of classifying an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A directed message the bot layer should act on.
    Directed(DirectedMessage),
    /// Anything else; carries the reason for logs.
    Ignored(IgnoreReason),
}

/// Why an inbound envelope was not acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    UnsupportedVersion(u32),
    NotDirected(MessageKind),
    MalformedPayload(String),
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "unsupported envelope version {v}"),
            Self::NotDirected(kind) => write!(f, "not a directed message ({kind})"),
            Self::MalformedPayload(reason) => write!(f, "malformed payload: {reason}"),
        }
    }
}

/// Apply the version, kind and payload gates to `envelope`.
pub fn classify(envelope: &Envelope) -> Inbound {
    if !envelope.is_current() {
        return Inbound::Ignored(IgnoreReason::UnsupportedVersion(envelope.version));
    }
    if envelope.kind != MessageKind::DirectedPrivmsg {
        return Inbound::Ignored(IgnoreReason::NotDirected(envelope.kind));
    }
    match envelope.directed() {
        Ok(directed) => Inbound::Directed(directed),
        Err(e) => Inbound::Ignored(IgnoreReason::MalformedPayload(e.to_string())),
    }
}
