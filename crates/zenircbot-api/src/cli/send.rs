//! One-shot publishing commands: `send`, `action`, `admin`.

use anyhow::Result;
use console::style;
use zenircbot_core::message::bus::BusConnection;
use zenircbot_core::service::Publisher;
use zenircbot_types::recipients::Recipients;

use crate::state::AppState;

/// What a one-shot command publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    Message,
    Action,
    Admin,
}

/// Publish `words` (joined by spaces) and report how many envelopes went out.
pub async fn send<C: BusConnection>(
    conn: &C,
    kind: SendKind,
    to: Vec<String>,
    words: &[String],
) -> Result<usize> {
    let text = words.join(" ");
    let mut publisher = Publisher::new(conn.open().await?);
    let sent = match kind {
        SendKind::Message => publisher.send_message(Recipients::from(to), &text).await?,
        SendKind::Action => publisher.send_action(Recipients::from(to), &text).await?,
        SendKind::Admin => publisher.send_admin_message(&text).await?,
    };
    tracing::debug!(?kind, sent, "one-shot send finished");
    Ok(sent)
}

/// `zenbot send|action|admin` against the configured bus.
pub async fn run_send(
    state: &AppState,
    kind: SendKind,
    to: Vec<String>,
    words: &[String],
    quiet: bool,
) -> Result<()> {
    let sent = send(&state.bus, kind, to, words).await?;
    if quiet {
        return Ok(());
    }

    if sent == 0 {
        println!(
            "  {} No admin channels configured, nothing sent.",
            style("!").yellow().bold()
        );
    } else {
        println!(
            "  {} Sent {} envelope{}",
            style("✓").green().bold(),
            sent,
            if sent == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
