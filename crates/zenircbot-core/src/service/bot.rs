//! `ZenBot` -- one bot service on the bus.
//!
//! A service is built in two phases. During setup, commands are registered
//! on the bot. `listen` then seals the registry, announces the service,
//! starts the discovery responder in the background and runs the dispatch
//! loop on the calling task until shutdown or failure.
//!
//! ```no_run
//! use zenircbot_core::ZenBot;
//! use zenircbot_core::message::{InMemoryBus, handler_fn};
//!
//! # async fn run() -> Result<(), zenircbot_types::error::BotError> {
//! let mut bot = ZenBot::new(InMemoryBus::new(), "pinger");
//! bot.register_with_description(
//!     "ping",
//!     "play ping-pong",
//!     handler_fn("ping", |_| Ok("pong".to_string())),
//! )?;
//! bot.listen().await
//! # }
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zenircbot_types::error::BotError;
use zenircbot_types::recipients::Recipients;

use super::announcer;
use super::dispatch;
use super::publisher::Publisher;
use super::registry::{AnnouncedCommand, CommandRegistry, Registration};
use crate::message::bus::BusConnection;
use crate::message::handler::CommandHandler;

/// A bot service bound to one bus connection.
pub struct ZenBot<C> {
    conn: Arc<C>,
    service_name: String,
    registry: CommandRegistry,
}

impl<C: BusConnection> ZenBot<C> {
    pub fn new(conn: C, service_name: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(conn), service_name)
    }

    /// Build on a connection shared with other owners.
    pub fn from_shared(conn: Arc<C>, service_name: impl Into<String>) -> Self {
        Self {
            conn,
            service_name: service_name.into(),
            registry: CommandRegistry::new(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Register a command with the default description.
    pub fn register<H>(&mut self, token: impl Into<String>, handler: H) -> Result<(), BotError>
    where
        H: CommandHandler + 'static,
    {
        self.registry.register(token, handler)
    }

    pub fn register_with_description<H>(
        &mut self,
        token: impl Into<String>,
        description: impl Into<String>,
        handler: H,
    ) -> Result<(), BotError>
    where
        H: CommandHandler + 'static,
    {
        self.registry
            .register_with_description(token, description, handler)
    }

    /// Open a publisher on a fresh bus handle.
    pub async fn publisher(&self) -> Result<Publisher<C::Handle>, BotError> {
        Ok(Publisher::new(self.conn.open().await?))
    }

    /// Send a chat message to one or many recipients.
    pub async fn send_message(
        &self,
        to: impl Into<Recipients>,
        message: &str,
    ) -> Result<usize, BotError> {
        self.publisher().await?.send_message(to, message).await
    }

    /// Send a chat action to one or many recipients.
    pub async fn send_action(
        &self,
        to: impl Into<Recipients>,
        message: &str,
    ) -> Result<usize, BotError> {
        self.publisher().await?.send_action(to, message).await
    }

    /// Send a message to the admin broadcast recipients, if any.
    pub async fn send_admin_message(&self, message: &str) -> Result<usize, BotError> {
        self.publisher().await?.send_admin_message(message).await
    }

    /// Announce `service` and start a discovery responder for `commands`.
    ///
    /// `listen` calls this with the bot's own registry; it is public for
    /// services that run their own loop.
    pub async fn register_commands(
        &self,
        service: &str,
        commands: Vec<AnnouncedCommand>,
        cancel: CancellationToken,
    ) -> Result<Option<JoinHandle<Result<(), BotError>>>, BotError> {
        announcer::register_commands(Arc::clone(&self.conn), service, commands, cancel).await
    }

    /// Run the service until the process ends or a failure occurs.
    pub async fn listen(&mut self) -> Result<(), BotError> {
        self.listen_until(CancellationToken::new()).await
    }

    /// Run the service until `shutdown` is cancelled or a failure occurs.
    ///
    /// The registry is sealed first; later registrations fail. The discovery
    /// responder is cancelled whenever this returns or its future is dropped.
    pub async fn listen_until(&mut self, shutdown: CancellationToken) -> Result<(), BotError> {
        self.registry.seal();
        let registrations: Arc<[Registration]> = self.registry.all().into();

        let responder_cancel = shutdown.child_token();
        let _responder_guard = responder_cancel.clone().drop_guard();
        let responder = self
            .register_commands(
                &self.service_name,
                self.registry.announced(),
                responder_cancel.clone(),
            )
            .await?;

        info!(service = %self.service_name, "service listening");
        let result = dispatch::run(Arc::clone(&self.conn), registrations, shutdown).await;

        responder_cancel.cancel();
        if let Some(handle) = responder
            && let Err(e) = handle.await
        {
            warn!(service = %self.service_name, error = %e, "discovery responder task panicked");
        }
        result
    }
}

impl<C> std::fmt::Debug for ZenBot<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZenBot")
            .field("service_name", &self.service_name)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::bus::{BusSubscription, InMemoryBus, InMemorySubscription};
    use crate::message::handler::handler_fn;
    use serde_json::Value;
    use std::time::Duration;
    use zenircbot_types::bus::{ADMIN_SPEW_KEY, IN_CHANNEL, OUT_CHANNEL};

    async fn out_subscription(bus: &InMemoryBus) -> InMemorySubscription {
        let mut out = bus.subscribe(OUT_CHANNEL).await.unwrap();
        out.next_frame().await.unwrap();
        out
    }

    async fn next_json(sub: &mut InMemorySubscription) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(5), sub.next_frame())
            .await
            .expect("timed out waiting for outbound message")
            .unwrap()
            .unwrap();
        serde_json::from_slice(frame.payload().unwrap()).unwrap()
    }

    async fn wait_for_subscribers(bus: &InMemoryBus, count: usize) {
        for _ in 0..200 {
            if bus.subscriber_count(IN_CHANNEL) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {count} subscribers");
    }

    fn pinger(bus: &InMemoryBus) -> ZenBot<InMemoryBus> {
        let mut bot = ZenBot::new(bus.clone(), "pinger");
        bot.register_with_description(
            "ping",
            "play ping-pong",
            handler_fn("ping", |_| Ok("pong".to_string())),
        )
        .unwrap();
        bot
    }

    #[tokio::test]
    async fn listen_announces_answers_and_dispatches() {
        let bus = InMemoryBus::new();
        bus.set(ADMIN_SPEW_KEY, "#ops");
        let mut out = out_subscription(&bus).await;

        let mut bot = pinger(&bus);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let task = tokio::spawn(async move {
            let result = bot.listen_until(stop).await;
            (bot, result)
        });

        let online = next_json(&mut out).await;
        assert_eq!(online["data"]["to"], "#ops");
        assert_eq!(online["data"]["message"], "pinger online!");

        // Responder and dispatch loop each hold their own subscription.
        wait_for_subscribers(&bus, 2).await;

        bus.publish(
            IN_CHANNEL,
            r##"{"version":1,"type":"directed_privmsg","data":{"sender":"alice","channel":"#zen","message":"commands"}}"##,
        );
        let reply = next_json(&mut out).await;
        assert_eq!(reply["data"]["to"], "alice");
        assert_eq!(reply["data"]["message"], "pinger: !ping - play ping-pong");

        bus.publish(
            IN_CHANNEL,
            r##"{"version":1,"type":"directed_privmsg","data":{"sender":"alice","channel":"#zen","message":"ping"}}"##,
        );
        let reply = next_json(&mut out).await;
        assert_eq!(reply["data"]["to"], "#zen");
        assert_eq!(reply["data"]["message"], "pong");

        shutdown.cancel();
        let (mut bot, result) = task.await.unwrap();
        result.unwrap();
        assert_eq!(bus.subscriber_count(IN_CHANNEL), 0);

        let err = bot
            .register("late", handler_fn("late", |_| Ok(String::new())))
            .unwrap_err();
        assert!(matches!(err, BotError::RegistryClosed));
    }

    #[tokio::test]
    async fn one_message_reaches_both_responder_and_dispatch() {
        let bus = InMemoryBus::new();
        let mut out = out_subscription(&bus).await;

        let mut bot = ZenBot::new(bus.clone(), "lister");
        bot.register(
            "comm",
            handler_fn("comm", |text| Ok(format!("comm saw {text}"))),
        )
        .unwrap();
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let task = tokio::spawn(async move { bot.listen_until(stop).await });
        wait_for_subscribers(&bus, 2).await;

        bus.publish(
            IN_CHANNEL,
            r##"{"version":1,"type":"directed_privmsg","data":{"sender":"alice","channel":"#zen","message":"commands"}}"##,
        );

        let mut replies = Vec::new();
        for _ in 0..2 {
            let msg = next_json(&mut out).await;
            replies.push((
                msg["data"]["to"].as_str().unwrap().to_string(),
                msg["data"]["message"].as_str().unwrap().to_string(),
            ));
        }
        replies.sort();
        assert_eq!(
            replies,
            vec![
                ("#zen".to_string(), "comm saw commands".to_string()),
                ("alice".to_string(), "lister: !comm - a command".to_string()),
            ]
        );

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn ignores_other_versions_entirely() {
        let bus = InMemoryBus::new();
        let mut out = out_subscription(&bus).await;

        let mut bot = pinger(&bus);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let task = tokio::spawn(async move { bot.listen_until(stop).await });
        wait_for_subscribers(&bus, 2).await;

        for message in ["ping", "commands", "services"] {
            bus.publish(
                IN_CHANNEL,
                format!(
                    r##"{{"version":2,"type":"directed_privmsg","data":{{"sender":"alice","channel":"#zen","message":"{message}"}}}}"##
                ),
            );
        }
        // A current-version message afterwards proves the earlier ones were
        // consumed without output.
        bus.publish(
            IN_CHANNEL,
            r##"{"version":1,"type":"directed_privmsg","data":{"sender":"alice","channel":"#zen","message":"ping"}}"##,
        );

        let reply = next_json(&mut out).await;
        assert_eq!(reply["data"]["message"], "pong");

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bot_without_commands_only_dispatches() {
        let bus = InMemoryBus::new();
        let mut bot = ZenBot::new(bus.clone(), "silent");
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let task = tokio::spawn(async move { bot.listen_until(stop).await });

        wait_for_subscribers(&bus, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bus.subscriber_count(IN_CHANNEL), 1);

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn convenience_sends() {
        let bus = InMemoryBus::new();
        let mut out = out_subscription(&bus).await;
        let bot = ZenBot::new(bus.clone(), "bot");

        assert_eq!(bot.send_admin_message("nobody listening").await.unwrap(), 0);
        assert_eq!(bot.send_message(["#a", "#b"], "hi").await.unwrap(), 2);
        assert_eq!(bot.send_action("#a", "waves").await.unwrap(), 1);

        assert_eq!(next_json(&mut out).await["data"]["to"], "#a");
        assert_eq!(next_json(&mut out).await["data"]["to"], "#b");
        assert_eq!(next_json(&mut out).await["type"], "privmsg_action");
    }
}
