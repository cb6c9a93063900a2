//! Score API Feed - Polling HTTP Adapter for the ScoreFeed Port
//!
//! Fetches finished games from the external scores endpoint. The feed is
//! untrusted: scores may be numbers or strings, entries may be missing,
//! and outages are routine. Decoding is therefore tolerant (malformed
//! entries are skipped with a warn) and fetches use an explicit timeout
//! plus a bounded retry loop — never unbounded recursion.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::outcome::{CompletedGame, ScoreEntry};
use crate::ports::score_feed::ScoreFeed;

/// Configuration for the score API client.
#[derive(Debug, Clone)]
pub struct ScoreApiConfig {
  /// Base URL of the scores provider.
  pub base_url: String,
  /// API key, appended as a query parameter.
  pub api_key: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum retries on transient errors within one fetch.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

/// Raw score entry as the provider delivers it. `score` may be a JSON
/// string or number; both are normalized to a string.
#[derive(Debug, Deserialize)]
struct RawScore {
  name: String,
  score: serde_json::Value,
}

/// Raw game as the provider delivers it.
#[derive(Debug, Deserialize)]
struct RawGame {
  id: String,
  home_team: String,
  away_team: String,
  #[serde(default)]
  completed: bool,
  #[serde(default)]
  scores: Option<Vec<RawScore>>,
}

/// HTTP adapter implementing the ScoreFeed port.
pub struct ScoreApiFeed {
  http: Client,
  config: ScoreApiConfig,
}

impl ScoreApiFeed {
  /// Create a new feed client.
  pub fn new(config: ScoreApiConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  /// Fetch the scores payload with bounded retries.
  async fn fetch_raw(&self) -> Result<Vec<RawGame>> {
    let url = format!(
      "{}/scores?apiKey={}&daysFrom=1",
      self.config.base_url, self.config.api_key
    );

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), "Retrying score fetch");
        sleep(delay).await;
      }

      match self.http.get(&url).send().await {
        Ok(response) => match response.status() {
          StatusCode::OK => {
            return response
              .json::<Vec<RawGame>>()
              .await
              .context("Failed to decode scores payload");
          }
          StatusCode::TOO_MANY_REQUESTS => {
            warn!("Rate limited by scores provider, backing off");
            last_error = Some(anyhow::anyhow!("Rate limited"));
            continue;
          }
          status if status.is_server_error() => {
            warn!(status = %status, "Scores provider server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
            continue;
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Scores API error {status}: {body}"));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, "Score fetch failed");
          last_error = Some(e.into());
          continue;
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }
}

/// Normalize a raw game into the domain shape, dropping malformed score
/// entries but keeping the game itself (the resolver reports what's
/// missing).
fn normalize(raw: RawGame) -> CompletedGame {
  let scores = raw
    .scores
    .unwrap_or_default()
    .into_iter()
    .filter_map(|entry| match entry.score {
      serde_json::Value::String(s) => Some(ScoreEntry {
        name: entry.name,
        score: s,
      }),
      serde_json::Value::Number(n) => Some(ScoreEntry {
        name: entry.name,
        score: n.to_string(),
      }),
      other => {
        warn!(team = %entry.name, value = %other, "Dropping malformed score entry");
        None
      }
    })
    .collect();

  CompletedGame {
    id: raw.id,
    home_team: raw.home_team,
    away_team: raw.away_team,
    completed: raw.completed,
    scores,
  }
}

#[async_trait]
impl ScoreFeed for ScoreApiFeed {
  async fn completed_games(&self) -> Result<Vec<CompletedGame>> {
    let raw = self.fetch_raw().await?;
    let games: Vec<CompletedGame> = raw.into_iter().map(normalize).collect();
    debug!(
      total = games.len(),
      completed = games.iter().filter(|g| g.completed).count(),
      "Fetched score feed"
    );
    Ok(games)
  }

  async fn is_healthy(&self) -> bool {
    self.fetch_raw().await.is_ok()
  }
}
