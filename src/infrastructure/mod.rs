//! Adapters implementing the domain ports: in-memory stores for embedding
//! and tests, an HTTP client for the payment gateway, and a notification
//! outbox.

pub mod http_gateway;
pub mod in_memory;
pub mod outbox;
