//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! IO: the scores HTTP feed, the keyed ledger store with file backing,
//! the chat-platform DM gateway, and the Prometheus metrics registry.

pub mod feeds;
pub mod messaging;
pub mod metrics;
pub mod persistence;
