//! Well-known bus names and the transport-neutral frame type.

/// Inbound channel: directed messages published by the chat bridge.
pub const IN_CHANNEL: &str = "in";

/// Outbound channel: messages for the chat bridge to relay.
pub const OUT_CHANNEL: &str = "out";

/// Key holding the admin broadcast recipients.
pub const ADMIN_SPEW_KEY: &str = "zenircbot:admin_spew_channels";

/// A frame received from a subscription.
///
/// Transports surface subscription control traffic (e.g. the acknowledgement
/// sent after `SUBSCRIBE`) alongside real messages; consumers skip anything
/// that is not [`Frame::Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The subscription to `channel` is active.
    Subscribed { channel: String },
    /// A published payload.
    Message { channel: String, payload: Vec<u8> },
}

impl Frame {
    /// Payload bytes when this is a message frame.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Message { payload, .. } => Some(payload),
            Self::Subscribed { .. } => None,
        }
    }
}
