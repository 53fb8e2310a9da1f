//! Pushes new transactions to the chat channel and the order system.
//!
//! Each transaction is handled on its own: a failed notification or order
//! never stops the next transaction from being processed.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{Direction, OrderReferencePattern, Transaction};
use crate::port::{Clock, Notifier, OrderGateway, OrderRequest};

/// Default pause between two notifications.
pub const DEFAULT_SPACING: Duration = Duration::from_millis(500);

/// Account details printed in every notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLabels {
    pub account: String,
    pub bank: String,
    pub currency: String,
}

impl Default for MessageLabels {
    fn default() -> Self {
        Self {
            account: String::new(),
            bank: String::new(),
            currency: "VND".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwarderSettings {
    pub spacing: Duration,
    pub labels: MessageLabels,
}

impl Default for ForwarderSettings {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            labels: MessageLabels::default(),
        }
    }
}

/// What happened on the order side for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Debit, no order reference, or order forwarding disabled.
    Skipped,
    /// Order created and confirmed.
    Completed { order_id: String },
    /// Order created but the system did not confirm it.
    Unconfirmed { order_id: String, reason: String },
    /// Order reference detected but the order could not be created.
    Failed { reason: String },
}

impl OrderOutcome {
    /// True when an order reference was found and the pipeline ran.
    #[must_use]
    pub const fn detected(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Per-transaction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub reference: String,
    pub notified: bool,
    pub order: OrderOutcome,
}

/// Result of forwarding a list of transactions, in forwarding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardReport {
    pub outcomes: Vec<TransactionOutcome>,
}

impl ForwardReport {
    #[must_use]
    pub fn notified(&self) -> usize {
        self.outcomes.iter().filter(|o| o.notified).count()
    }

    #[must_use]
    pub fn orders_detected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.order.detected()).count()
    }

    #[must_use]
    pub fn orders_completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.order, OrderOutcome::Completed { .. }))
            .count()
    }

    /// Nothing to send, or at least one notification went through.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.is_empty() || self.notified() > 0
    }
}

/// Stateless fan-out of transactions to notifier and order system.
pub struct Forwarder {
    notifier: Arc<dyn Notifier>,
    orders: Option<Arc<dyn OrderGateway>>,
    pattern: OrderReferencePattern,
    clock: Arc<dyn Clock>,
    settings: ForwarderSettings,
}

impl Forwarder {
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        orders: Option<Arc<dyn OrderGateway>>,
        pattern: OrderReferencePattern,
        clock: Arc<dyn Clock>,
        settings: ForwarderSettings,
    ) -> Self {
        Self {
            notifier,
            orders,
            pattern,
            clock,
            settings,
        }
    }

    /// Forward transactions given in fetch order (newest first).
    ///
    /// Transactions are processed oldest first so that messages arrive in
    /// chronological order.
    pub async fn forward(&self, transactions: &[Transaction]) -> ForwardReport {
        let mut report = ForwardReport::default();
        if transactions.is_empty() {
            return report;
        }

        info!(
            count = transactions.len(),
            notifier = self.notifier.name(),
            orders_enabled = self.orders.is_some(),
            "Forwarding new transactions"
        );

        for (index, tx) in transactions.iter().rev().enumerate() {
            if index > 0 && !self.settings.spacing.is_zero() {
                self.clock.sleep(self.settings.spacing).await;
            }
            let notified = self.notify(tx).await;
            let order = self.process_order(tx).await;
            report.outcomes.push(TransactionOutcome {
                reference: tx.reference().to_string(),
                notified,
                order,
            });
        }

        info!(
            total = transactions.len(),
            notified = report.notified(),
            orders_detected = report.orders_detected(),
            orders_completed = report.orders_completed(),
            "Forwarding complete"
        );
        report
    }

    /// Send a free-form alert through the notifier.
    pub async fn alert(&self, message: &str) -> bool {
        match self.notifier.send(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, notifier = self.notifier.name(), "Failed to send alert");
                false
            }
        }
    }

    async fn notify(&self, tx: &Transaction) -> bool {
        let message = format_message(tx, &self.settings.labels);
        match self.notifier.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    reference = %tx.reference(),
                    notifier = self.notifier.name(),
                    error = %e,
                    "Failed to send transaction notification"
                );
                false
            }
        }
    }

    async fn process_order(&self, tx: &Transaction) -> OrderOutcome {
        let Some(orders) = self.orders.as_ref() else {
            return OrderOutcome::Skipped;
        };
        if !tx.is_credit() || tx.amount <= Decimal::ZERO {
            debug!(reference = %tx.reference(), "Not a credit, skipping order");
            return OrderOutcome::Skipped;
        }
        let Some(order_reference) = self.pattern.detect(&tx.description) else {
            debug!(reference = %tx.reference(), "No order reference in description");
            return OrderOutcome::Skipped;
        };

        info!(reference = %tx.reference(), order_reference, "Order reference detected");
        let request = OrderRequest {
            order_reference: order_reference.to_string(),
            transaction_reference: tx.reference().to_string(),
            customer_name: tx.counterparty.trim().to_string(),
            amount: tx.amount,
            paid_at: tx.posted_at,
        };

        let order_id = match orders.create_order(&request).await {
            Ok(id) => id,
            Err(e) => {
                warn!(reference = %tx.reference(), order_reference, error = %e, "Failed to create order");
                return OrderOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = match orders.confirm_order(&order_id).await {
            Ok(true) => {
                info!(order_id = %order_id, order_reference, "Order confirmed");
                OrderOutcome::Completed { order_id }
            }
            Ok(false) => {
                warn!(order_id = %order_id, "Order confirmation not acknowledged");
                OrderOutcome::Unconfirmed {
                    order_id,
                    reason: "confirmation not acknowledged".into(),
                }
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Failed to confirm order");
                OrderOutcome::Unconfirmed {
                    order_id,
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = orders.notify_payment(&request).await {
            warn!(order_reference, error = %e, "Payment webhook failed");
        }
        outcome
    }
}

/// Render the chat message for one transaction.
#[must_use]
pub fn format_message(tx: &Transaction, labels: &MessageLabels) -> String {
    let when = tx.posted_at.map_or_else(
        || "an unknown time".to_string(),
        |at| at.format("%d/%m/%Y %H:%M:%S").to_string(),
    );
    let amount = group_thousands(tx.amount);
    let headline = match tx.direction {
        Direction::Credit => {
            format!("Account balance increased by {amount} {} at {when}", labels.currency)
        }
        Direction::Debit => {
            format!("Account balance decreased by {amount} {} at {when}", labels.currency)
        }
    };

    let mut message = format!(
        "{headline}\nDescription: {}\nReference: {}",
        tx.description.trim(),
        tx.reference()
    );
    if !labels.account.is_empty() {
        message.push_str(&format!("\nAccount: {}", labels.account));
    }
    if !labels.bank.is_empty() {
        message.push_str(&format!("\nBank: {}", labels.bank));
    }
    message
}

/// `1250000` becomes `1,250,000`. Fractional digits are kept as-is.
fn group_thousands(amount: Decimal) -> String {
    let normalized = amount.abs().normalize().to_string();
    let (int_part, frac_part) = match normalized.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (normalized.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    if amount.is_sign_negative() && !amount.is_zero() {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{DEFAULT_ORDER_DIGITS, DEFAULT_ORDER_PREFIX};
    use crate::testkit::clock::FakeClock;
    use crate::testkit::domain::{credit, debit, described, instant};
    use crate::testkit::notifier::RecordingNotifier;
    use crate::testkit::order::RecordingOrders;
    use rust_decimal_macros::dec;

    struct Fixture {
        notifier: Arc<RecordingNotifier>,
        orders: Arc<RecordingOrders>,
        clock: Arc<FakeClock>,
        forwarder: Forwarder,
    }

    fn fixture(with_orders: bool) -> Fixture {
        let notifier = Arc::new(RecordingNotifier::new());
        let orders = Arc::new(RecordingOrders::new());
        let clock = Arc::new(FakeClock::new(instant("2025-06-05 03:00:00")));
        let gateway: Option<Arc<dyn OrderGateway>> = if with_orders {
            Some(orders.clone())
        } else {
            None
        };
        let forwarder = Forwarder::new(
            notifier.clone(),
            gateway,
            OrderReferencePattern::new(DEFAULT_ORDER_PREFIX, DEFAULT_ORDER_DIGITS).unwrap(),
            clock.clone(),
            ForwarderSettings {
                labels: MessageLabels {
                    account: "839689988".into(),
                    bank: "Example Bank".into(),
                    currency: "VND".into(),
                },
                ..ForwarderSettings::default()
            },
        );
        Fixture {
            notifier,
            orders,
            clock,
            forwarder,
        }
    }

    #[tokio::test]
    async fn forwards_oldest_first_with_spacing() {
        let f = fixture(false);
        // Fetch order: newest first.
        let txs = vec![
            credit("FT0000000003", 300, "2025-06-05 09:03:00"),
            credit("FT0000000002", 200, "2025-06-05 09:02:00"),
            credit("FT0000000001", 100, "2025-06-05 09:01:00"),
        ];

        let report = f.forwarder.forward(&txs).await;

        let order: Vec<_> = report.outcomes.iter().map(|o| o.reference.as_str()).collect();
        assert_eq!(order, vec!["FT0000000001", "FT0000000002", "FT0000000003"]);
        assert!(f.notifier.sent()[0].contains("FT0000000001"));
        assert_eq!(f.clock.sleeps(), vec![DEFAULT_SPACING; 2]);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn failure_on_second_transaction_is_isolated() {
        let f = fixture(true);
        f.notifier.fail_call(2);
        f.orders.fail_create_for("FT0000000002");
        let txs = vec![
            described(credit("FT0000000003", 300, "2025-06-05 09:03:00"), "pay GH000003"),
            described(credit("FT0000000002", 200, "2025-06-05 09:02:00"), "pay GH000002"),
            described(credit("FT0000000001", 100, "2025-06-05 09:01:00"), "pay GH000001"),
        ];

        let report = f.forwarder.forward(&txs).await;

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].notified);
        assert!(!report.outcomes[1].notified);
        assert!(report.outcomes[2].notified);
        assert!(matches!(report.outcomes[1].order, OrderOutcome::Failed { .. }));
        assert_eq!(
            report.outcomes[2].order,
            OrderOutcome::Completed {
                order_id: "1002".into()
            }
        );
        assert_eq!(report.orders_detected(), 3);
        assert_eq!(report.orders_completed(), 2);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn all_notifications_failing_is_reported_not_raised() {
        let f = fixture(false);
        f.notifier.fail_all();
        let txs = vec![credit("FT0000000001", 100, "2025-06-05 09:01:00")];

        let report = f.forwarder.forward(&txs).await;

        assert_eq!(report.notified(), 0);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn empty_input_is_success() {
        let f = fixture(true);
        let report = f.forwarder.forward(&[]).await;

        assert!(report.is_success());
        assert_eq!(f.notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn only_credits_with_order_reference_reach_the_order_system() {
        let f = fixture(true);
        let txs = vec![
            described(debit("FT0000000003", 300, "2025-06-05 09:03:00"), "refund GH000003"),
            described(credit("FT0000000002", 200, "2025-06-05 09:02:00"), "thanks"),
            described(credit("FT0000000001", 100, "2025-06-05 09:01:00"), "CK.GH123456 order"),
        ];

        let report = f.forwarder.forward(&txs).await;

        let created = f.orders.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].order_reference, "GH123456");
        assert_eq!(created[0].transaction_reference, "FT0000000001");
        assert_eq!(created[0].customer_name, "ACME TRADING CO");
        assert_eq!(f.orders.payments().len(), 1);
        assert_eq!(report.outcomes[1].order, OrderOutcome::Skipped);
        assert_eq!(report.outcomes[2].order, OrderOutcome::Skipped);
        assert_eq!(f.notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn unconfirmed_order_is_reported() {
        let f = fixture(true);
        f.orders.reject_confirmations();
        let txs = vec![described(
            credit("FT0000000001", 100, "2025-06-05 09:01:00"),
            "GH654321",
        )];

        let report = f.forwarder.forward(&txs).await;

        assert!(matches!(
            &report.outcomes[0].order,
            OrderOutcome::Unconfirmed { order_id, .. } if order_id == "1001"
        ));
        assert_eq!(report.orders_completed(), 0);
    }

    #[tokio::test]
    async fn disabled_orders_skip_detection() {
        let f = fixture(false);
        let txs = vec![described(
            credit("FT0000000001", 100, "2025-06-05 09:01:00"),
            "GH654321",
        )];

        let report = f.forwarder.forward(&txs).await;

        assert_eq!(report.outcomes[0].order, OrderOutcome::Skipped);
        assert!(f.orders.created().is_empty());
    }

    #[test]
    fn message_layout() {
        let tx = described(credit("FT25156ABCDE", 1_250_000, "2025-06-05 09:01:00"), "pay GH000001");
        let labels = MessageLabels {
            account: "839689988".into(),
            bank: "Example Bank".into(),
            currency: "VND".into(),
        };

        assert_eq!(
            format_message(&tx, &labels),
            "Account balance increased by 1,250,000 VND at 05/06/2025 09:01:00\n\
             Description: pay GH000001\n\
             Reference: FT25156ABCDE\n\
             Account: 839689988\n\
             Bank: Example Bank"
        );
    }

    #[test]
    fn debit_message_without_labels() {
        let tx = described(debit("FT25156ABCDE", 5_000, "2025-06-05 09:01:00"), "fee");
        let message = format_message(&tx, &MessageLabels::default());

        assert!(message.starts_with("Account balance decreased by 5,000 VND"));
        assert!(!message.contains("Account:"));
    }

    #[test]
    fn message_for_undated_row() {
        let mut tx = described(credit("FT25156ABCDE", 1_000, "2025-06-05 09:01:00"), "pay");
        tx.posted_at = None;

        let message = format_message(&tx, &MessageLabels::default());

        assert!(message.starts_with("Account balance increased by 1,000 VND at an unknown time\n"));
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(dec!(0)), "0");
        assert_eq!(group_thousands(dec!(999)), "999");
        assert_eq!(group_thousands(dec!(1000)), "1,000");
        assert_eq!(group_thousands(dec!(1250000)), "1,250,000");
        assert_eq!(group_thousands(dec!(1234.50)), "1,234.5");
    }
}
