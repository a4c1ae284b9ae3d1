//! Command registry for one bot service.
//!
//! Registrations are kept in insertion order and matched by plain string
//! prefix, first match wins. Tokens are not required to be unique. The
//! registry is open during setup and sealed when the service starts
//! listening; registering after that is an error rather than a silent no-op.

use std::sync::Arc;

use zenircbot_types::error::BotError;

use crate::message::handler::CommandHandler;

/// Description used when a command is registered without one.
pub const DEFAULT_DESCRIPTION: &str = "a command";

/// One registered command.
#[derive(Clone)]
pub struct Registration {
    /// Prefix that triggers the command.
    pub token: String,
    pub description: String,
    /// Handler name, taken from [`CommandHandler::name`].
    pub name: String,
    handler: Arc<dyn CommandHandler>,
}

impl Registration {
    /// Whether this command's token is a prefix of `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.starts_with(self.token.as_str())
    }

    /// Run the handler on `text`.
    pub fn invoke(&self, text: &str) -> anyhow::Result<String> {
        self.handler.handle(text)
    }

    /// The `!`-prefixed form used in discovery replies.
    pub fn announced(&self) -> AnnouncedCommand {
        AnnouncedCommand {
            name: format!("!{}", self.token),
            description: self.description.clone(),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("token", &self.token)
            .field("description", &self.description)
            .field("name", &self.name)
            .finish()
    }
}

/// A command as advertised to discovery queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedCommand {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryState {
    Open,
    Sealed,
}

/// Ordered, append-only command registry.
#[derive(Debug)]
pub struct CommandRegistry {
    registrations: Vec<Registration>,
    state: RegistryState,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            state: RegistryState::Open,
        }
    }

    /// Register `handler` under `token` with the default description.
    pub fn register<H>(&mut self, token: impl Into<String>, handler: H) -> Result<(), BotError>
    where
        H: CommandHandler + 'static,
    {
        self.register_with_description(token, DEFAULT_DESCRIPTION, handler)
    }

    /// Register `handler` under `token`.
    ///
    /// Fails with [`BotError::RegistryClosed`] once the registry is sealed.
    pub fn register_with_description<H>(
        &mut self,
        token: impl Into<String>,
        description: impl Into<String>,
        handler: H,
    ) -> Result<(), BotError>
    where
        H: CommandHandler + 'static,
    {
        if self.state == RegistryState::Sealed {
            return Err(BotError::RegistryClosed);
        }
        let token = token.into();
        let name = handler.name().to_string();
        tracing::debug!(%token, %name, "registered command");
        self.registrations.push(Registration {
            token,
            description: description.into(),
            name,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// All registrations in insertion order.
    pub fn all(&self) -> &[Registration] {
        &self.registrations
    }

    /// The first registration whose token is a prefix of `text`.
    pub fn first_match(&self, text: &str) -> Option<&Registration> {
        first_match(&self.registrations, text)
    }

    /// Discovery view of every registration, in order.
    pub fn announced(&self) -> Vec<AnnouncedCommand> {
        self.registrations.iter().map(Registration::announced).collect()
    }

    /// Close the registry to further registration. Idempotent.
    pub fn seal(&mut self) {
        self.state = RegistryState::Sealed;
    }

    pub fn is_sealed(&self) -> bool {
        self.state == RegistryState::Sealed
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First registration in `registrations` whose token is a prefix of `text`.
pub fn first_match<'a>(registrations: &'a [Registration], text: &str) -> Option<&'a Registration> {
    registrations.iter().find(|r| r.matches(text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
