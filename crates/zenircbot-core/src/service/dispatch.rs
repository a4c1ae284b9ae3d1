//! Command dispatch loop.
//!
//! Subscribes to `in` and, for every directed message, runs the first
//! registered command whose token is a prefix of the message text. The
//! handler's return value is posted to the channel the message came from.
//!
//! Malformed or foreign envelopes are dropped and the loop carries on.
//! Transport failures and handler failures end the loop: a broken handler is
//! a bug and is surfaced rather than skipped.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use zenircbot_types::bus::IN_CHANNEL;
use zenircbot_types::envelope::Envelope;
use zenircbot_types::error::{BotError, TransportError};

use super::publisher::Publisher;
use super::registry::{Registration, first_match};
use crate::message::bus::{BusConnection, BusHandle};
use crate::message::router::{self, Inbound};
use crate::message::subscriber::EnvelopeStream;

/// What happened to one inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A command ran and its reply was published.
    Replied { token: String, channel: String },
    /// A directed message that matched no command.
    NoMatch,
    /// A command matched but the message named no channel to reply to.
    NoChannel { token: String },
    /// Not a directed message we act on.
    Ignored,
}

/// Run the dispatch loop until `shutdown` is cancelled or a failure occurs.
///
/// Cancellation is the only clean exit; a closed subscription is reported as
/// a transport error.
pub async fn run<C: BusConnection>(
    conn: Arc<C>,
    registrations: Arc<[Registration]>,
    shutdown: CancellationToken,
) -> Result<(), BotError> {
    let mut stream = EnvelopeStream::new(IN_CHANNEL, conn.subscribe(IN_CHANNEL).await?);
    let mut publisher = Publisher::new(conn.open().await?);
    info!(commands = registrations.len(), "dispatch loop listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("dispatch loop shutting down");
                return Ok(());
            }
            next = stream.next_envelope() => {
                let Some(envelope) = next? else {
                    return Err(TransportError::Closed(IN_CHANNEL.to_string()).into());
                };
                dispatch_envelope(&registrations, &mut publisher, &envelope).await?;
            }
        }
    }
}

/// Route one envelope to the first matching command and publish its reply.
pub async fn dispatch_envelope<H: BusHandle>(
    registrations: &[Registration],
    publisher: &mut Publisher<H>,
    envelope: &Envelope,
) -> Result<Dispatched, BotError> {
    let directed = match router::classify(envelope) {
        Inbound::Directed(directed) => directed,
        Inbound::Ignored(reason) => {
            trace!(%reason, "envelope ignored");
            return Ok(Dispatched::Ignored);
        }
    };

    let text = directed.message.as_str();
    let Some(command) = first_match(registrations, text) else {
        trace!(%text, "no command matched");
        return Ok(Dispatched::NoMatch);
    };

    let Some(channel) = directed.channel.as_deref() else {
        warn!(
            token = %command.token,
            sender = directed.sender.as_deref().unwrap_or("-"),
            "directed message has no channel, reply dropped"
        );
        return Ok(Dispatched::NoChannel {
            token: command.token.clone(),
        });
    };

    debug!(token = %command.token, handler = %command.name, %channel, "dispatching command");
    let reply = command.invoke(text).map_err(|source| BotError::Handler {
        token: command.token.clone(),
        source: source.into(),
    })?;
    publisher.send_message(channel, &reply).await?;

    Ok(Dispatched::Replied {
        token: command.token.clone(),
        channel: channel.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
