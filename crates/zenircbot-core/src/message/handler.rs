//! Command handler trait.
//!
//! A command handler receives the full text of a directed message whose
//! prefix matched its token, and returns the reply to post back to the
//! channel. An error is a bug in the handler: the dispatch loop stops on it.

/// Callback invoked when a registered command token matches.
pub trait CommandHandler: Send + Sync {
    /// Produce the reply for `text` (the whole message, token included).
    fn handle(&self, text: &str) -> anyhow::Result<String>;

    /// Name recorded on the registration, for logs and introspection.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A named closure handler. Build with [`handler_fn`].
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

/// Wrap a closure as a [`CommandHandler`] with the given name.
///
/// ```
/// use zenircbot_core::message::handler_fn;
///
/// let ping = handler_fn("ping", |_text| Ok("pong".to_string()));
/// ```
pub fn handler_fn<F>(name: &'static str, f: F) -> FnHandler<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    FnHandler { name, f }
}

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn handle(&self, text: &str) -> anyhow::Result<String> {
        (self.f)(text)
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl CommandHandler for Shout {
        fn handle(&self, text: &str) -> anyhow::Result<String> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn fn_handler_uses_given_name() {
        let h = handler_fn("echo", |text| Ok(text.to_string()));
        assert_eq!(h.name(), "echo");
        assert_eq!(h.handle("echo hi").unwrap(), "echo hi");
    }

    #[test]
    fn default_name_is_type_name() {
        assert!(Shout.name().ends_with("Shout"));
        assert_eq!(Shout.handle("quiet").unwrap(), "QUIET");
    }

    #[test]
    fn handler_errors_propagate() {
        let h = handler_fn("boom", |_| anyhow::bail!("exploded"));
        let err = h.handle("boom").unwrap_err();
        assert_eq!(err.to_string(), "exploded");
    }
}
