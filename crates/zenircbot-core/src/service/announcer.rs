//! Service announcement and discovery responder.
//!
//! When a service starts it tells the admin channels it is online, then (if
//! it has any commands) spawns a background task that answers two discovery
//! queries arriving on `in`:
//! - `commands` -- one reply per command: `"<service>: !<token> - <description>"`
//! - `services` -- the service name
//!
//! Replies go to the sender of the query. The responder holds its own
//! subscription and publish handle and runs until cancelled.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zenircbot_types::bus::IN_CHANNEL;
use zenircbot_types::envelope::{DirectedMessage, Envelope};
use zenircbot_types::error::{BotError, TransportError};

use super::publisher::Publisher;
use super::registry::AnnouncedCommand;
use crate::message::bus::{BusConnection, BusHandle};
use crate::message::router::{self, Inbound};
use crate::message::subscriber::EnvelopeStream;

/// Discovery query listing a service's commands.
pub const COMMANDS_QUERY: &str = "commands";

/// Discovery query listing services.
pub const SERVICES_QUERY: &str = "services";

/// Announce `service` and start its discovery responder.
///
/// The online announcement is published before anything is spawned. With
/// no commands, no responder is started and `Ok(None)` is returned.
pub async fn register_commands<C: BusConnection>(
    conn: Arc<C>,
    service: &str,
    commands: Vec<AnnouncedCommand>,
    cancel: CancellationToken,
) -> Result<Option<JoinHandle<Result<(), BotError>>>, BotError> {
    let mut publisher = Publisher::new(conn.open().await?);
    publisher
        .send_admin_message(&format!("{service} online!"))
        .await?;
    info!(%service, commands = commands.len(), "service announced");

    if commands.is_empty() {
        return Ok(None);
    }

    let service = service.to_string();
    let commands: Arc<[AnnouncedCommand]> = commands.into();
    let handle = tokio::spawn(async move {
        let result = run_responder(conn, &service, &commands, cancel).await;
        if let Err(e) = &result {
            error!(%service, error = %e, "discovery responder stopped");
        }
        result
    });
    Ok(Some(handle))
}

/// Subscribe to `in` and answer discovery queries until cancelled.
pub async fn run_responder<C: BusConnection>(
    conn: Arc<C>,
    service: &str,
    commands: &[AnnouncedCommand],
    cancel: CancellationToken,
) -> Result<(), BotError> {
    let mut stream = EnvelopeStream::new(IN_CHANNEL, conn.subscribe(IN_CHANNEL).await?);
    let mut publisher = Publisher::new(conn.open().await?);
    debug!(%service, "discovery responder listening");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%service, "discovery responder cancelled");
                return Ok(());
            }
            next = stream.next_envelope() => {
                let Some(envelope) = next? else {
                    return Err(TransportError::Closed(IN_CHANNEL.to_string()).into());
                };
                respond(&mut publisher, service, commands, &envelope).await?;
            }
        }
    }
}

/// Answer `envelope` if it is a discovery query. Returns the number of
/// replies published.
pub async fn respond<H: BusHandle>(
    publisher: &mut Publisher<H>,
    service: &str,
    commands: &[AnnouncedCommand],
    envelope: &Envelope,
) -> Result<usize, BotError> {
    let Inbound::Directed(directed) = router::classify(envelope) else {
        return Ok(0);
    };

    let replies = discovery_replies(service, commands, &directed);
    if replies.is_empty() {
        return Ok(0);
    }
    let Some(sender) = directed.sender.as_deref() else {
        warn!(
            %service,
            query = %directed.message,
            "discovery query has no sender, replies dropped"
        );
        return Ok(0);
    };

    let mut sent = 0;
    for reply in &replies {
        sent += publisher.send_message(sender, reply).await?;
    }
    debug!(%service, %sender, query = %directed.message, sent, "answered discovery query");
    Ok(sent)
}

/// Reply lines for a directed message; empty when it is not a query.
pub fn discovery_replies(
    service: &str,
    commands: &[AnnouncedCommand],
    directed: &DirectedMessage,
) -> Vec<String> {
    match directed.message.as_str() {
        COMMANDS_QUERY => commands
            .iter()
            .map(|c| format!("{service}: {} - {}", c.name, c.description))
            .collect(),
        SERVICES_QUERY => vec![service.to_string()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
