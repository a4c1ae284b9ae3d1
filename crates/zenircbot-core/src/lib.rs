//! Message-bus protocol and command-dispatch engine for ZenIRCBot services.
//!
//! This crate defines the bus "ports" (`BusConnection`, `BusHandle`,
//! `BusSubscription`) that the infrastructure layer implements, plus
//! everything that runs on top of them: the envelope codec, the publisher,
//! the command registry, the discovery responder and the dispatch loop. It
//! depends only on `zenircbot-types` -- never on `zenircbot-infra` or any
//! network client crate.

pub mod message;
pub mod service;

pub use service::bot::ZenBot;
