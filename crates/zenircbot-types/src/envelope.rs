//! Wire envelope exchanged on every bus channel.
//!
//! Every message on `in` and `out` is a JSON object of the form
//! `{"version": 1, "type": "...", "data": {...}}`. The `data` payload is kept
//! as raw JSON on the envelope and interpreted on demand through the typed
//! accessors, so an envelope with an unexpected payload shape can still be
//! inspected (and ignored) without failing the whole decode.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// The only envelope version this crate produces or acts upon.
pub const ENVELOPE_VERSION: u32 = 1;

/// Envelope `type` tag.
///
/// Tags this crate does not know decode to [`MessageKind::Unknown`] so that
/// newer producers on the bus do not turn into decode failures here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Outbound chat message.
    Privmsg,
    /// Outbound chat action (`/me ...`).
    PrivmsgAction,
    /// Inbound chat message addressed at the bot layer.
    DirectedPrivmsg,
    /// Any tag this crate does not understand.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Privmsg => "privmsg",
            Self::PrivmsgAction => "privmsg_action",
            Self::DirectedPrivmsg => "directed_privmsg",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A versioned bus message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version; see [`ENVELOPE_VERSION`].
    pub version: u32,
    /// Interpretation of `data`.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Whether this envelope carries the protocol version we understand.
    pub fn is_current(&self) -> bool {
        self.version == ENVELOPE_VERSION
    }

    /// Interpret `data` as an inbound directed message.
    ///
    /// Only meaningful when `kind` is [`MessageKind::DirectedPrivmsg`]; the
    /// kind is not checked here.
    pub fn directed(&self) -> Result<DirectedMessage, CodecError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| CodecError::Decoding(format!("directed_privmsg payload: {e}")))
    }

    /// Interpret `data` as an outbound message.
    pub fn outbound(&self) -> Result<OutboundMessage, CodecError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| CodecError::Decoding(format!("{} payload: {e}", self.kind)))
    }
}

/// Payload of outbound `privmsg` and `privmsg_action` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Channel or nick the chat bridge should deliver to.
    pub to: String,
    pub message: String,
}

/// Payload of inbound `directed_privmsg` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedMessage {
    /// Nick of the user who spoke. Discovery replies go here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Channel the message was spoken in. Command replies go here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
