//! Authentication module for the Payql SDK.
//!
//! This module provides:
//! - In-memory token storage with expiry tracking
//! - Single-flight token refresh with retry and backoff
//! - The `AuthManager` facade used by the request layer

mod coordinator;
mod manager;
mod retry;
mod token_store;

pub use coordinator::RefreshCoordinator;
pub use manager::{AuthManager, AuthSettings};
pub use retry::RetryPolicy;
pub use token_store::{TokenStatus, TokenStore};
