//! Bus plumbing: transport traits, the envelope codec, handler trait, inbound
//! routing and decoded subscriptions.
//!
//! - `bus` -- `BusConnection`/`BusHandle`/`BusSubscription` traits and the
//!   in-process `InMemoryBus`
//! - `envelope` -- encode/decode and helper constructors for `Envelope`
//! - `handler` -- `CommandHandler` trait for command callbacks
//! - `router` -- classification of inbound envelopes (version gate, kind gate)
//! - `subscriber` -- `EnvelopeStream`, a subscription yielding decoded envelopes

pub mod bus;
pub mod envelope;
pub mod handler;
pub mod router;
pub mod subscriber;

pub use bus::{BusConnection, BusHandle, BusSubscription, InMemoryBus};
pub use handler::{CommandHandler, handler_fn};
pub use subscriber::EnvelopeStream;
