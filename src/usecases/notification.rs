//! Notification Dispatcher - Settlement Result Messages
//!
//! Consumes post-commit settlement events and delivers a direct message
//! to each bet's owner. Delivery failures are logged and swallowed here;
//! nothing that happens in this module can reach back into the financial
//! transaction that already committed.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::bet::BetResult;
use crate::ports::messenger::Messenger;
use crate::usecases::ledger_txn::SettlementEvent;

/// Best-effort delivery of settlement results to bet owners.
pub struct NotificationDispatcher<M: Messenger> {
  messenger: Arc<M>,
  /// In dry-run mode messages are logged, never sent.
  dry_run: bool,
}

impl<M: Messenger> NotificationDispatcher<M> {
  /// Create a dispatcher over the given messenger.
  pub fn new(messenger: Arc<M>, dry_run: bool) -> Self {
    Self { messenger, dry_run }
  }

  /// Deliver one settlement event. Never fails, never blocks settlement.
  pub async fn dispatch(&self, event: &SettlementEvent) {
    let content = format_result_message(event);

    if self.dry_run {
      debug!(
        user_id = %event.user_id,
        bet_id = %event.bet_id,
        content = %content,
        "Dry-run: settlement notification suppressed"
      );
      return;
    }

    if let Err(e) = self.messenger.send_direct(&event.user_id, &content).await {
      warn!(
        user_id = %event.user_id,
        bet_id = %event.bet_id,
        error = %e,
        "Failed to deliver settlement notification"
      );
    }
  }
}

/// Render the user-facing result line for a settled bet.
fn format_result_message(event: &SettlementEvent) -> String {
  match event.result {
    BetResult::Won => format!(
      "Your bet won! Payout: ${} (profit ${}). New balance: ${}",
      event.payout, event.profit, event.new_balance
    ),
    BetResult::Lost => format!(
      "Your bet lost. Balance: ${}",
      event.new_balance
    ),
    // Pending never appears post-commit; render it neutrally anyway.
    BetResult::Pending => format!("Your bet is still pending. Balance: ${}", event.new_balance),
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  fn event(result: BetResult) -> SettlementEvent {
    SettlementEvent {
      user_id: "u1".to_string(),
      bet_id: "b1".to_string(),
      result,
      payout: dec!(166.67),
      profit: dec!(66.67),
      new_balance: dec!(666.67),
    }
  }

  #[test]
  fn win_message_includes_payout_and_balance() {
    let msg = format_result_message(&event(BetResult::Won));
    assert!(msg.contains("won"));
    assert!(msg.contains("166.67"));
    assert!(msg.contains("66.67"));
    assert!(msg.contains("666.67"));
  }

  #[test]
  fn loss_message_omits_payout() {
    let msg = format_result_message(&event(BetResult::Lost));
    assert!(msg.contains("lost"));
    assert!(!msg.contains("166.67"));
  }
}
