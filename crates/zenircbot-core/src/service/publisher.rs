//! Outbound publisher for chat messages, actions and admin broadcasts.
//!
//! Each recipient gets its own envelope and its own publish on `out`, in the
//! order the recipients were given. There is no batching and no retry; the
//! first failed publish is returned to the caller.

use serde::Serialize;
use tracing::debug;
use zenircbot_types::bus::{ADMIN_SPEW_KEY, OUT_CHANNEL};
use zenircbot_types::envelope::MessageKind;
use zenircbot_types::error::BotError;
use zenircbot_types::recipients::Recipients;

use crate::message::bus::BusHandle;
use crate::message::envelope;

/// Borrowed outbound payload, encoded once per recipient.
#[derive(Serialize)]
struct Outbound<'a> {
    to: &'a str,
    message: &'a str,
}

/// Sends typed outbound envelopes over one bus handle.
pub struct Publisher<H> {
    handle: H,
}

impl<H: BusHandle> Publisher<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    /// Send `message` as a chat message to every recipient.
    ///
    /// Returns the number of envelopes published.
    pub async fn send_message(
        &mut self,
        to: impl Into<Recipients>,
        message: &str,
    ) -> Result<usize, BotError> {
        self.send(MessageKind::Privmsg, &to.into(), message).await
    }

    /// Send `message` as a chat action (`/me`) to every recipient.
    pub async fn send_action(
        &mut self,
        to: impl Into<Recipients>,
        message: &str,
    ) -> Result<usize, BotError> {
        self.send(MessageKind::PrivmsgAction, &to.into(), message).await
    }

    /// Send `message` to the admin broadcast recipients.
    ///
    /// A missing or empty admin key is not an error; nothing is sent.
    pub async fn send_admin_message(&mut self, message: &str) -> Result<usize, BotError> {
        match self.admin_channels().await? {
            Some(recipients) => self.send_message(recipients, message).await,
            None => {
                debug!("no admin channels configured, admin message dropped");
                Ok(0)
            }
        }
    }

    /// Read the admin broadcast recipients from the shared key.
    pub async fn admin_channels(&mut self) -> Result<Option<Recipients>, BotError> {
        let raw = self.handle.get(ADMIN_SPEW_KEY).await?;
        Ok(raw.as_deref().and_then(parse_admin_channels))
    }

    async fn send(
        &mut self,
        kind: MessageKind,
        to: &Recipients,
        message: &str,
    ) -> Result<usize, BotError> {
        let mut sent = 0;
        for target in to.iter() {
            let outbound = Outbound {
                to: target,
                message,
            };
            let payload = envelope::encode(kind, &outbound)?;
            self.handle.publish(OUT_CHANNEL, &payload).await?;
            debug!(%kind, to = %target, "published outbound envelope");
            sent += 1;
        }
        Ok(sent)
    }
}

impl<H> std::fmt::Debug for Publisher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish_non_exhaustive()
    }
}

/// Interpret the admin key value.
///
/// A JSON array of strings lists several recipients; any other non-empty
/// value is a single recipient.
fn parse_admin_channels(raw: &str) -> Option<Recipients> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('[')
        && let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed)
    {
        return (!list.is_empty()).then_some(Recipients::Many(list));
    }
    Some(Recipients::One(trimmed.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::bus::{
        BusConnection, BusSubscription, InMemoryBus, InMemoryHandle, InMemorySubscription,
    };
    use serde_json::{Value, json};

    async fn setup() -> (InMemoryBus, Publisher<InMemoryHandle>, InMemorySubscription) {
        let bus = InMemoryBus::new();
        let mut out = bus.subscribe(OUT_CHANNEL).await.unwrap();
        out.next_frame().await.unwrap(); // subscribe ack
        let publisher = Publisher::new(bus.open().await.unwrap());
        (bus, publisher, out)
    }

    async fn next_json(sub: &mut InMemorySubscription) -> Value {
        let frame = sub.next_frame().await.unwrap().unwrap();
        serde_json::from_slice(frame.payload().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn fan_out_in_order() {
        let (_bus, mut publisher, mut out) = setup().await;

        let sent = publisher.send_message(["a", "b"], "hi").await.unwrap();
        assert_eq!(sent, 2);

        assert_eq!(
            next_json(&mut out).await,
            json!({"version": 1, "type": "privmsg", "data": {"to": "a", "message": "hi"}})
        );
        assert_eq!(
            next_json(&mut out).await,
            json!({"version": 1, "type": "privmsg", "data": {"to": "b", "message": "hi"}})
        );
    }

    #[tokio::test]
    async fn single_string_is_one_envelope() {
        let (_bus, mut publisher, mut out) = setup().await;

        let sent = publisher.send_message("abc", "hi").await.unwrap();
        assert_eq!(sent, 1);

        let msg = next_json(&mut out).await;
        assert_eq!(msg["data"]["to"], "abc");
    }

    #[tokio::test]
    async fn action_uses_action_type() {
        let (_bus, mut publisher, mut out) = setup().await;

        publisher.send_action("#zen", "waves").await.unwrap();

        let msg = next_json(&mut out).await;
        assert_eq!(msg["type"], "privmsg_action");
        assert_eq!(msg["data"]["message"], "waves");
    }

    #[tokio::test]
    async fn admin_message_without_key_is_noop() {
        let (_bus, mut publisher, _out) = setup().await;
        let sent = publisher.send_admin_message("x").await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn admin_message_single_channel() {
        let (bus, mut publisher, mut out) = setup().await;
        bus.set(ADMIN_SPEW_KEY, "#ops");

        let sent = publisher.send_admin_message("weather online!").await.unwrap();
        assert_eq!(sent, 1);

        let msg = next_json(&mut out).await;
        assert_eq!(
            msg["data"],
            json!({"to": "#ops", "message": "weather online!"})
        );
    }

    #[tokio::test]
    async fn admin_message_json_list() {
        let (bus, mut publisher, mut out) = setup().await;
        bus.set(ADMIN_SPEW_KEY, r##"["#ops", "#log"]"##);

        let sent = publisher.send_admin_message("restarting").await.unwrap();
        assert_eq!(sent, 2);
        assert_eq!(next_json(&mut out).await["data"]["to"], "#ops");
        assert_eq!(next_json(&mut out).await["data"]["to"], "#log");
    }

    #[test]
    fn parse_admin_channels_cases() {
        assert_eq!(parse_admin_channels(""), None);
        assert_eq!(parse_admin_channels("  "), None);
        assert_eq!(parse_admin_channels("[]"), None);
        assert_eq!(
            parse_admin_channels("#ops"),
            Some(Recipients::One("#ops".to_string()))
        );
        // Not a valid JSON list: treated as a literal channel name.
        assert_eq!(
            parse_admin_channels("[weird"),
            Some(Recipients::One("[weird".to_string()))
        );
    }
}
