//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the SDK core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_transport;

pub use clock::Clock;
pub use http_transport::{HttpResponse, HttpTransport, PostOptions, TransportError};
