//! Ledger and task-assignment engine for a paid micro-task platform.
//!
//! The crate owns three concerns: wallet balances and their ledger rows,
//! reconciliation of asynchronous payment-gateway events, and the
//! assignment and review lifecycle of social-media tasks. Everything else
//! (HTTP surface, auth, notification delivery) belongs to the host and is
//! reached through the port traits in [`domain::ports`].

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
