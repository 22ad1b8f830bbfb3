//! Best-effort exit: cancel everything resting, then dump the position.

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::gateway::OrderGateway;
use crate::metrics;
use crate::trading::OrderParams;

/// What a liquidation managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidationReport {
    /// Orders successfully cancelled.
    pub cancelled: Vec<String>,
    /// Orders whose cancellation failed, with the reason.
    pub cancel_failures: Vec<(String, String)>,
    /// Venue id of the exit sell, if it was accepted.
    pub exit_order_id: Option<String>,
    /// Why the exit sell did not go through, if it was attempted and failed.
    pub exit_error: Option<String>,
}

impl LiquidationReport {
    /// True when every cancel succeeded and the exit sell (if any) was accepted.
    pub fn is_clean(&self) -> bool {
        self.cancel_failures.is_empty() && self.exit_error.is_none()
    }
}

/// Cancel every open order on `token_id`, then sell `amount` at `exit_price`.
///
/// Every step is attempted once. A failed cancel does not stop the others
/// and nothing already cancelled is restored. The sell is priced low enough
/// to cross standing bids. Failures are logged and reported, never returned.
#[instrument(skip(gateway), fields(token_id = %token_id))]
pub async fn liquidate<G>(
    gateway: &G,
    token_id: &str,
    amount: Decimal,
    exit_price: Decimal,
) -> LiquidationReport
where
    G: OrderGateway + ?Sized,
{
    metrics::inc_liquidations();
    let mut report = LiquidationReport::default();

    match gateway.open_orders(token_id).await {
        Ok(orders) => {
            info!(count = orders.len(), "Cancelling open orders");
            for order in orders {
                match gateway.cancel_order(&order.id).await {
                    Ok(()) => {
                        metrics::inc_orders_cancelled();
                        report.cancelled.push(order.id);
                    }
                    Err(e) => {
                        metrics::inc_cancel_failures();
                        warn!(order_id = %order.id, error = %e, "Cancel failed; continuing");
                        report.cancel_failures.push((order.id, e.to_string()));
                    }
                }
            }
        }
        Err(e) => error!(error = %e, "Could not list open orders; skipping cancels"),
    }

    if amount <= Decimal::ZERO {
        info!("Nothing held; no exit order");
        return report;
    }

    let params = OrderParams::sell(token_id, exit_price, amount);
    match gateway.submit_order(&params).await {
        Ok(ack) => match ack.accepted_id() {
            Some(order_id) => {
                metrics::inc_orders_submitted();
                info!(order_id, %amount, price = %exit_price, "Exit order placed");
                report.exit_order_id = Some(order_id.to_string());
            }
            None => {
                metrics::inc_orders_failed();
                let reason = ack
                    .error_msg
                    .unwrap_or_else(|| "no order id returned".to_string());
                error!(%amount, reason = %reason, "Exit order refused");
                report.exit_error = Some(reason);
            }
        },
        Err(e) => {
            metrics::inc_orders_failed();
            error!(%amount, error = %e, "Exit order failed");
            report.exit_error = Some(e.to_string());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{MockGateway, SubmitBehavior};
    use crate::trading::{OpenOrder, Side};
    use rust_decimal_macros::dec;

    fn gateway_with_two_orders() -> MockGateway {
        let gateway = MockGateway::new();
        gateway.add_open_order(OpenOrder::with_id("0x1"));
        gateway.add_open_order(OpenOrder::with_id("0x2"));
        gateway
    }

    #[tokio::test]
    async fn first_cancel_failure_does_not_stop_the_rest() {
        let gateway = gateway_with_two_orders();
        gateway.fail_cancel("0x1");

        let report = liquidate(&gateway, "tok", dec!(100), dec!(0.01)).await;

        assert_eq!(gateway.cancel_attempts(), vec!["0x1", "0x2"]);
        assert_eq!(report.cancelled, vec!["0x2".to_string()]);
        assert_eq!(report.cancel_failures.len(), 1);
        assert!(!report.is_clean());

        let sells = gateway.submitted_on(Side::Sell);
        assert_eq!(sells, vec![OrderParams::sell("tok", dec!(0.01), dec!(100))]);
        assert!(report.exit_order_id.is_some());
    }

    #[tokio::test]
    async fn zero_amount_only_cancels() {
        let gateway = gateway_with_two_orders();

        let report = liquidate(&gateway, "tok", dec!(0), dec!(0.01)).await;

        assert_eq!(report.cancelled.len(), 2);
        assert!(gateway.submitted().is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn listing_failure_still_sells() {
        let gateway = MockGateway::new();
        gateway.set_fail_open_orders(true);

        let report = liquidate(&gateway, "tok", dec!(5), dec!(0.01)).await;

        assert!(gateway.cancel_attempts().is_empty());
        assert_eq!(gateway.submitted_on(Side::Sell).len(), 1);
        assert!(report.exit_order_id.is_some());
    }

    #[tokio::test]
    async fn refused_sell_is_reported_not_retried() {
        let gateway = MockGateway::new();
        gateway.script_submissions([SubmitBehavior::Reject("crossed".to_string())]);

        let report = liquidate(&gateway, "tok", dec!(5), dec!(0.01)).await;

        assert_eq!(gateway.submitted().len(), 1);
        assert_eq!(report.exit_error.as_deref(), Some("crossed"));
    }
}
