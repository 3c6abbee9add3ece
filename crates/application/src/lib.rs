//! Payql Application - Token lifecycle and GraphQL request layer
//!
//! This crate holds the SDK's behavior. It talks to the outside world only
//! through the ports in [`ports`]; the infrastructure crate provides the
//! concrete adapters.

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;

#[cfg(test)]
mod testing;

pub use auth::{AuthManager, AuthSettings, RefreshCoordinator, RetryPolicy, TokenStatus, TokenStore};
pub use client::GraphqlClient;
pub use error::{SdkError, SdkResult};
