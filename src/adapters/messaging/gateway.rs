//! Messaging Gateway - HTTP Adapter for the Messenger Port
//!
//! Delivers direct messages through the chat platform's REST gateway.
//! DM endpoints are aggressively rate-limited platform-side, so every
//! send first waits on a local `governor` limiter; a 429 from the
//! gateway is still surfaced as an error for the caller to swallow.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::domain::bet::UserId;
use crate::ports::messenger::Messenger;

/// Configuration for the messaging gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  /// Base URL of the chat platform REST API.
  pub base_url: String,
  /// Bot token, sent as the Authorization header.
  pub bot_token: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum DM sends per second.
  pub requests_per_second: u32,
}

/// Rate-limited HTTP messenger.
pub struct MessagingGateway {
  http: Client,
  config: GatewayConfig,
  limiter: DefaultDirectRateLimiter,
}

impl MessagingGateway {
  /// Create a new gateway client.
  pub fn new(config: GatewayConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("Failed to build HTTP client")?;

    let per_second = NonZeroU32::new(config.requests_per_second)
      .context("requests_per_second must be nonzero")?;
    let limiter = RateLimiter::direct(Quota::per_second(per_second));

    Ok(Self {
      http,
      config,
      limiter,
    })
  }
}

#[async_trait]
impl Messenger for MessagingGateway {
  async fn send_direct(&self, user_id: &UserId, content: &str) -> Result<()> {
    self.limiter.until_ready().await;

    let url = format!("{}/users/{}/messages", self.config.base_url, user_id);
    let response = self
      .http
      .post(&url)
      .header("Authorization", format!("Bot {}", self.config.bot_token))
      .json(&json!({ "content": content }))
      .send()
      .await
      .context("DM request failed")?;

    match response.status() {
      StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
        debug!(user_id = %user_id, "Direct message delivered");
        Ok(())
      }
      StatusCode::FORBIDDEN => {
        // User blocks DMs or left the server; caller treats as non-fatal.
        Err(anyhow::anyhow!("user {user_id} unreachable (DMs blocked)"))
      }
      status => {
        let body = response.text().await.unwrap_or_default();
        Err(anyhow::anyhow!("Gateway error {status}: {body}"))
      }
    }
  }

  async fn is_healthy(&self) -> bool {
    let url = format!("{}/gateway", self.config.base_url);
    self
      .http
      .get(&url)
      .send()
      .await
      .map(|r| r.status().is_success())
      .unwrap_or(false)
  }
}
