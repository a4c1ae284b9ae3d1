//! Envelope codec and helper constructors.
//!
//! `encode` always stamps the current protocol version. `decode` only checks
//! that the bytes are a well-formed envelope; version and kind gating is the
//! router's job.

use serde::Serialize;
use zenircbot_types::envelope::{
    DirectedMessage, ENVELOPE_VERSION, Envelope, MessageKind, OutboundMessage,
};
use zenircbot_types::error::CodecError;

/// Borrowed wire form, so `data` keeps its field order on the wire.
#[derive(Serialize)]
struct WireEnvelope<'a, T: Serialize> {
    version: u32,
    #[serde(rename = "type")]
    kind: MessageKind,
    data: &'a T,
}

/// Serialize `data` into a version 1 envelope of the given kind.
pub fn encode<T: Serialize>(kind: MessageKind, data: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(&WireEnvelope {
        version: ENVELOPE_VERSION,
        kind,
        data,
    })
    .map_err(|e| CodecError::Encoding(e.to_string()))
}

/// Parse raw bytes into an envelope.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decoding(e.to_string()))
}

/// Build an outbound `privmsg` envelope.
pub fn privmsg(to: impl Into<String>, message: impl Into<String>) -> Envelope {
    outbound(MessageKind::Privmsg, to, message)
}

/// Build an outbound `privmsg_action` envelope.
pub fn action(to: impl Into<String>, message: impl Into<String>) -> Envelope {
    outbound(MessageKind::PrivmsgAction, to, message)
}

/// Build an inbound `directed_privmsg` envelope, as the chat bridge would.
pub fn directed(
    sender: impl Into<String>,
    channel: impl Into<String>,
    message: impl Into<String>,
) -> Envelope {
    let data = DirectedMessage {
        sender: Some(sender.into()),
        channel: Some(channel.into()),
        message: message.into(),
    };
    Envelope {
        version: ENVELOPE_VERSION,
        kind: MessageKind::DirectedPrivmsg,
        data: serde_json::json!(data),
    }
}

fn outbound(kind: MessageKind, to: impl Into<String>, message: impl Into<String>) -> Envelope {
    let data = OutboundMessage {
        to: to.into(),
        message: message.into(),
    };
    Envelope {
        version: ENVELOPE_VERSION,
        kind,
        data: serde_json::json!(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_stamps_version_and_keeps_field_order() {
        let bytes = encode(
            MessageKind::Privmsg,
            &OutboundMessage {
                to: "a".to_string(),
                message: "hi".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"version":1,"type":"privmsg","data":{"to":"a","message":"hi"}}"#
        );
    }

    #[test]
    fn decode_reproduces_kind_and_data() {
        let data = json!({"sender": "alice", "channel": "#zen", "message": "ping"});
        let bytes = encode(MessageKind::DirectedPrivmsg, &data).unwrap();

        let env = decode(&bytes).unwrap();
        assert_eq!(env.version, ENVELOPE_VERSION);
        assert_eq!(env.kind, MessageKind::DirectedPrivmsg);
        assert_eq!(env.data, data);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        let cases: [&[u8]; 4] = [
            b"not json",
            b"{}",
            br#"{"version":1}"#,
            br#"{"version":"one","type":"privmsg"}"#,
        ];
        for bad in cases {
            assert!(
                matches!(decode(bad), Err(CodecError::Decoding(_))),
                "expected decoding error for {:?}",
                String::from_utf8_lossy(bad)
            );
        }
    }

    #[test]
    fn encode_non_string_map_keys_fails() {
        let mut data = std::collections::HashMap::new();
        data.insert(vec![1u8], "value");
        assert!(matches!(
            encode(MessageKind::Privmsg, &data),
            Err(CodecError::Encoding(_))
        ));
    }

    #[test]
    fn helper_constructors() {
        let env = action("#zen", "dances");
        assert_eq!(env.kind, MessageKind::PrivmsgAction);
        assert_eq!(env.outbound().unwrap().to, "#zen");

        let env = directed("alice", "#zen", "services");
        let msg = env.directed().unwrap();
        assert_eq!(msg.channel.as_deref(), Some("#zen"));
        assert_eq!(msg.message, "services");

        let env = privmsg("bob", "hi");
        assert!(env.is_current());
        assert_eq!(env.data, json!({"to": "bob", "message": "hi"}));
    }
}
