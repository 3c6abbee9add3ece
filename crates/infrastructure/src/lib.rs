//! Payql Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the environment loader.

pub mod adapters;
pub mod config;

pub use adapters::{ReqwestTransport, SystemClock};
pub use config::{config_from_env, config_from_lookup};
