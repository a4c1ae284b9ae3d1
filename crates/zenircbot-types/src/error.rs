use thiserror::Error;

/// Errors from envelope encoding and decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be serialized. A programmer error.
    #[error("failed to encode envelope: {0}")]
    Encoding(String),

    /// The bytes were not a well-formed envelope.
    #[error("failed to decode envelope: {0}")]
    Decoding(String),
}

/// Errors from the pub/sub transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to bus: {0}")]
    Connect(String),

    #[error("publish to '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },

    #[error("subscribe to '{channel}' failed: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("key read '{key}' failed: {reason}")]
    Read { key: String, reason: String },

    #[error("subscription to '{0}' closed")]
    Closed(String),
}

/// Errors surfaced by a running bot service.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A command handler failed. Handlers are not retried or skipped.
    #[error("command '{token}' failed: {source}")]
    Handler {
        token: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("command registry is closed; register commands before listen()")]
    RegistryClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Publish {
            channel: "out".to_string(),
            reason: "broken pipe".to_string(),
        };
        assert_eq!(err.to_string(), "publish to 'out' failed: broken pipe");
    }

    #[test]
    fn test_bot_error_from_transport_is_transparent() {
        let err: BotError = TransportError::Closed("in".to_string()).into();
        assert_eq!(err.to_string(), "subscription to 'in' closed");
    }

    #[test]
    fn test_handler_error_names_token() {
        let err = BotError::Handler {
            token: "weather".to_string(),
            source: "upstream 503".into(),
        };
        assert_eq!(err.to_string(), "command 'weather' failed: upstream 503");
    }
}
