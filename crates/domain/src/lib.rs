//! Payql Domain - Core SDK types
//!
//! This crate defines the domain model for the Payql payments GraphQL SDK.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;

pub use auth::{AuthError, Credentials, TokenExpiry, TokenRecord, TokenResponse};
pub use config::SdkConfig;
pub use error::{DomainError, DomainResult};
pub use graphql::{GraphqlError, GraphqlOperation, GraphqlRequest, GraphqlResponse};
