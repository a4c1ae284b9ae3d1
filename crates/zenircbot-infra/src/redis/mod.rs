//! Redis implementation of the bus traits.
//!
//! `RedisBus` keeps only the client (connection settings). Every `open`
//! creates a new multiplexed connection and every `subscribe` a new pub/sub
//! connection, so each task on the service owns its own sockets. There is no
//! reconnection logic here: a dropped connection surfaces as a
//! `TransportError` and the process is expected to be restarted.

use std::pin::Pin;

use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, Client, Msg};
use futures_util::{Stream, StreamExt};
use tracing::debug;
use zenircbot_core::message::bus::{BusConnection, BusHandle, BusSubscription};
use zenircbot_types::bus::Frame;
use zenircbot_types::config::BusConfig;
use zenircbot_types::error::TransportError;

/// Bus connection backed by a Redis server.
#[derive(Debug, Clone)]
pub struct RedisBus {
    config: BusConfig,
    client: Client,
}

impl RedisBus {
    /// Build a bus for `config`. Does not connect yet.
    pub fn new(config: BusConfig) -> Result<Self, TransportError> {
        let client =
            Client::open(config.url()).map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

impl BusConnection for RedisBus {
    type Handle = RedisHandle;
    type Subscription = RedisSubscription;

    async fn open(&self) -> Result<RedisHandle, TransportError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(host = %self.config.host, port = self.config.port, "opened redis connection");
        Ok(RedisHandle { conn })
    }

    async fn subscribe(&self, channel: &str) -> Result<RedisSubscription, TransportError> {
        let subscribe_err = |e: ::redis::RedisError| TransportError::Subscribe {
            channel: channel.to_string(),
            reason: e.to_string(),
        };

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(subscribe_err)?;
        pubsub.subscribe(channel).await.map_err(subscribe_err)?;
        debug!(%channel, "subscribed to redis channel");

        Ok(RedisSubscription {
            channel: channel.to_string(),
            messages: Box::pin(pubsub.into_on_message()),
            acknowledged: false,
        })
    }
}

/// Publish/read handle over a multiplexed Redis connection.
pub struct RedisHandle {
    conn: MultiplexedConnection,
}

impl BusHandle for RedisHandle {
    async fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<(), TransportError> {
        let receivers: i64 = self
            .conn
            .publish(channel, payload)
            .await
            .map_err(|e| TransportError::Publish {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
        debug!(%channel, receivers, "published to redis");
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, TransportError> {
        self.conn
            .get(key)
            .await
            .map_err(|e| TransportError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for RedisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHandle").finish_non_exhaustive()
    }
}

/// A Redis `SUBSCRIBE` on one channel.
///
/// The client library consumes the server's subscribe confirmation itself,
/// so the acknowledgement frame is emitted once `SUBSCRIBE` has returned.
pub struct RedisSubscription {
    channel: String,
    messages: Pin<Box<dyn Stream<Item = Msg> + Send>>,
    acknowledged: bool,
}

impl BusSubscription for RedisSubscription {
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        if !self.acknowledged {
            self.acknowledged = true;
            return Ok(Some(Frame::Subscribed {
                channel: self.channel.clone(),
            }));
        }
        Ok(self.messages.next().await.map(|msg| message_frame(&msg)))
    }
}

impl std::fmt::Debug for RedisSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSubscription")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

fn message_frame(msg: &Msg) -> Frame {
    Frame::Message {
        channel: msg.get_channel_name().to_string(),
        payload: msg.get_payload_bytes().to_vec(),
    }
}
