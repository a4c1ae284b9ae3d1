//! Infrastructure layer for ZenIRCBot services.
//!
//! Contains the Redis implementation of the bus traits defined in
//! `zenircbot-core` and the service config file loader.

pub mod config;
pub mod redis;
