//! Messaging Adapters - Direct Message Delivery
//!
//! Implements the Messenger port: a rate-limited HTTP gateway client for
//! production and a log-only messenger for dry runs and tests.

pub mod gateway;
pub mod log_only;

pub use gateway::{GatewayConfig, MessagingGateway};
pub use log_only::LogMessenger;
