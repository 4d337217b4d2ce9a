//! Application layer containing the core business logic orchestration.
//!
//! Each service owns one concern of the engine: wallet mutations, gateway
//! reconciliation, task funding and moderation, assignment, and review.
//! The `Engine` facade wires them over a shared set of domain ports.

pub mod catalog;
pub mod engine;
pub mod reconciler;
pub mod review;
pub mod selector;
pub mod wallet_service;
