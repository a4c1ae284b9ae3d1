//! Bus connection traits and an in-process bus.
//!
//! A `BusConnection` holds immutable connection settings and hands out fresh
//! handles on demand: a `BusHandle` for publishing and key reads, and a
//! `BusSubscription` per subscribed channel. Every long-lived task opens its
//! own handles so nothing has to be locked or shared.
//!
//! `InMemoryBus` implements the traits on `tokio::sync::broadcast`, one
//! channel per name, with a key/value map alongside. It backs the tests and
//! local demos; the Redis implementation lives in `zenircbot-infra`.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use zenircbot_types::bus::Frame;
use zenircbot_types::error::TransportError;

/// Buffer size for each in-memory broadcast channel.
const BROADCAST_BUFFER: usize = 1024;

/// A source of publish handles and subscriptions for one bus.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in zenircbot-infra.
pub trait BusConnection: Send + Sync + 'static {
    type Handle: BusHandle;
    type Subscription: BusSubscription;

    /// Open a new publish/read handle.
    fn open(&self) -> impl Future<Output = Result<Self::Handle, TransportError>> + Send;

    /// Open a new subscription to `channel`.
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl Future<Output = Result<Self::Subscription, TransportError>> + Send;
}

/// A handle used to publish payloads and read shared keys.
pub trait BusHandle: Send + 'static {
    /// Publish one payload to `channel`.
    fn publish(
        &mut self,
        channel: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read a string key. Returns None if the key does not exist.
    fn get(
        &mut self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// A live subscription to one channel.
pub trait BusSubscription: Send + 'static {
    /// Wait for the next frame. Returns `Ok(None)` once the transport has
    /// closed the subscription.
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Frame>, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory bus
// ---------------------------------------------------------------------------

struct Inner {
    /// Per-channel broadcast senders (channel name -> sender).
    channels: DashMap<String, broadcast::Sender<Vec<u8>>>,
    /// Key/value namespace.
    keys: DashMap<String, String>,
}

/// Process-local bus with pub/sub channels and a key/value namespace.
///
/// Cloning the bus shares the same channels and keys.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: DashMap::new(),
                keys: DashMap::new(),
            }),
        }
    }

    /// Set a key in the key/value namespace.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.inner.keys.insert(key.to_string(), value.into());
    }

    /// Remove a key. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.keys.remove(key).is_some()
    }

    /// Publish a payload and return how many subscribers received it.
    ///
    /// If the channel does not exist or has no subscribers, the payload is
    /// silently dropped.
    pub fn publish(&self, channel: &str, payload: impl Into<Vec<u8>>) -> usize {
        self.inner.publish(channel, payload.into())
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn subscribe_now(&self, channel: &str) -> InMemorySubscription {
        let rx = self
            .inner
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(BROADCAST_BUFFER);
                tx
            })
            .subscribe();
        debug!(%channel, "in-memory subscription opened");
        InMemorySubscription {
            channel: channel.to_string(),
            rx,
            acknowledged: false,
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn publish(&self, channel: &str, payload: Vec<u8>) -> usize {
        match self.channels.get(channel) {
            Some(sender) => sender.send(payload).unwrap_or_else(|_| {
                debug!(%channel, "no active subscribers on channel");
                0
            }),
            None => {
                debug!(%channel, "channel does not exist, payload dropped");
                0
            }
        }
    }
}

impl std::fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBus")
            .field("channels", &self.inner.channels.len())
            .field("keys", &self.inner.keys.len())
            .finish()
    }
}

impl BusConnection for InMemoryBus {
    type Handle = InMemoryHandle;
    type Subscription = InMemorySubscription;

    async fn open(&self) -> Result<InMemoryHandle, TransportError> {
        Ok(InMemoryHandle {
            inner: Arc::clone(&self.inner),
        })
    }

    async fn subscribe(&self, channel: &str) -> Result<InMemorySubscription, TransportError> {
        Ok(self.subscribe_now(channel))
    }
}

/// Publish/read handle on an [`InMemoryBus`].
pub struct InMemoryHandle {
    inner: Arc<Inner>,
}

impl BusHandle for InMemoryHandle {
    async fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.inner.publish(channel, payload.to_vec());
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, TransportError> {
        Ok(self.inner.keys.get(key).map(|v| v.value().clone()))
    }
}

/// Subscription on an [`InMemoryBus`].
///
/// Like a Redis subscription, the first frame is the subscribe
/// acknowledgement.
pub struct InMemorySubscription {
    channel: String,
    rx: broadcast::Receiver<Vec<u8>>,
    acknowledged: bool,
}

impl BusSubscription for InMemorySubscription {
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        if !self.acknowledged {
            self.acknowledged = true;
            return Ok(Some(Frame::Subscribed {
                channel: self.channel.clone(),
            }));
        }

        loop {
            match self.rx.recv().await {
                Ok(payload) => {
                    return Ok(Some(Frame::Message {
                        channel: self.channel.clone(),
                        payload,
                    }));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // At-most-once delivery: lost payloads are not replayed.
                    warn!(channel = %self.channel, skipped, "subscriber lagged, payloads dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
