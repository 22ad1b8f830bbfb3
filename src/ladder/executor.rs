//! Ladder execution.

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use super::planner::LadderPlan;
use crate::error::TradingError;
use crate::gateway::OrderGateway;
use crate::metrics;
use crate::trading::PlacedOrder;

/// What happened when a plan was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Orders the venue accepted, in schedule order.
    pub placed: Vec<PlacedOrder>,
    /// Rungs that failed or were refused.
    pub failed: usize,
    /// Profit baseline: the plan's maximum cost, whatever actually got placed.
    pub max_cost: Decimal,
}

impl ExecutionSummary {
    /// Cost if every accepted order fills.
    pub fn placed_cost(&self) -> Decimal {
        self.placed.iter().map(|o| o.price * o.size).sum()
    }
}

/// Submit every rung of `plan` for `token_id`, one at a time.
///
/// A rung whose submission errors or is refused is logged and skipped; the
/// remaining rungs are still sent and nothing is retried. An empty `placed`
/// list is a valid outcome, not an error.
#[instrument(skip(gateway, plan), fields(rungs = plan.len(), max_cost = %plan.max_cost()))]
pub async fn execute<G>(gateway: &G, plan: &LadderPlan, token_id: &str) -> ExecutionSummary
where
    G: OrderGateway + ?Sized,
{
    let mut placed = Vec::with_capacity(plan.len());
    let mut failed = 0;

    for params in plan.order_params(token_id) {
        let outcome = match gateway.submit_order(&params).await {
            Ok(ack) => match ack.accepted_id() {
                Some(order_id) => Ok(order_id.to_string()),
                None => Err(TradingError::OrderRejected {
                    reason: ack
                        .error_msg
                        .clone()
                        .unwrap_or_else(|| "no order id returned".to_string()),
                }),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(order_id) => {
                metrics::inc_orders_submitted();
                info!(
                    order_id = %order_id,
                    price = %params.price,
                    size = %params.size,
                    notional = %params.notional(),
                    "Placed ladder order"
                );
                placed.push(PlacedOrder {
                    order_id,
                    price: params.price,
                    size: params.size,
                });
            }
            Err(e) => {
                metrics::inc_orders_failed();
                failed += 1;
                error!(price = %params.price, size = %params.size, error = %e, "Failed to place ladder order");
            }
        }
    }

    if placed.is_empty() {
        warn!("No ladder orders were accepted; monitoring anyway");
    } else {
        info!(placed = placed.len(), failed, "Ladder submission complete");
    }

    ExecutionSummary {
        placed,
        failed,
        max_cost: plan.max_cost(),
    }
}
