//! Shared types for the ZenIRCBot service bus.
//!
//! This crate contains the wire envelope exchanged on every bus channel, the
//! recipient sum type used by the publisher, connection/service configuration,
//! and the error taxonomy shared by the core and infrastructure crates.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod bus;
pub mod config;
pub mod envelope;
pub mod error;
pub mod recipients;
