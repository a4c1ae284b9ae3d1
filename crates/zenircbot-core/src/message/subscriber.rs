//! Decoded envelope subscriptions.
//!
//! `EnvelopeStream` wraps a raw `BusSubscription` and yields only decoded
//! envelopes. Control frames are skipped, and a payload that fails to decode
//! is logged and dropped so one bad publisher cannot stop a consumer.

use tracing::{debug, warn};
use zenircbot_types::bus::Frame;
use zenircbot_types::envelope::Envelope;
use zenircbot_types::error::TransportError;

use super::bus::BusSubscription;
use super::envelope;

/// A subscription yielding decoded envelopes.
pub struct EnvelopeStream<S> {
    channel: String,
    inner: S,
}

impl<S: BusSubscription> EnvelopeStream<S> {
    pub fn new(channel: impl Into<String>, inner: S) -> Self {
        Self {
            channel: channel.into(),
            inner,
        }
    }

    /// Channel this stream is subscribed to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Wait for the next well-formed envelope.
    ///
    /// Returns `Ok(None)` when the transport closes the subscription.
    pub async fn next_envelope(&mut self) -> Result<Option<Envelope>, TransportError> {
        loop {
            let Some(frame) = self.inner.next_frame().await? else {
                return Ok(None);
            };

            let payload = match frame {
                Frame::Message { payload, .. } => payload,
                Frame::Subscribed { channel } => {
                    debug!(%channel, "subscription acknowledged");
                    continue;
                }
            };

            match envelope::decode(&payload) {
                Ok(env) => return Ok(Some(env)),
                Err(e) => {
                    warn!(channel = %self.channel, error = %e, "dropping undecodable message");
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for EnvelopeStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeStream")
            .field("channel", &self.channel)
            .finish()
    }
}
