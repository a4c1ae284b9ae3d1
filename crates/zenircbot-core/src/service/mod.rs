//! The running service: publisher, command registry, discovery responder,
//! dispatch loop and the `ZenBot` facade that ties them together.

pub mod announcer;
pub mod bot;
pub mod dispatch;
pub mod publisher;
pub mod registry;

pub use bot::ZenBot;
pub use publisher::Publisher;
pub use registry::{AnnouncedCommand, CommandRegistry, Registration};
