//! Ladder planning.

use rust_decimal::Decimal;

use crate::error::PlanError;
use crate::trading::{OrderParams, Side};

/// One rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOrder {
    /// Limit price, strictly between 0 and 1.
    pub price: Decimal,
    /// Shares to buy at that price.
    pub size: Decimal,
}

impl PlannedOrder {
    /// Cost if this rung fills completely.
    pub fn cost(&self) -> Decimal {
        self.price * self.size
    }
}

/// Immutable set of buy orders for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderPlan {
    orders: Vec<PlannedOrder>,
    max_cost: Decimal,
}

impl LadderPlan {
    /// Rungs in schedule order.
    pub fn orders(&self) -> &[PlannedOrder] {
        &self.orders
    }

    /// Cost if every rung fills: the sum of price times size.
    pub fn max_cost(&self) -> Decimal {
        self.max_cost
    }

    /// Shares held if every rung fills.
    pub fn total_size(&self) -> Decimal {
        self.orders.iter().map(|o| o.size).sum()
    }

    /// Side every ladder order is placed on.
    pub fn side(&self) -> Side {
        Side::Buy
    }

    /// Order parameters for each rung on `token_id`.
    pub fn order_params(&self, token_id: &str) -> Vec<OrderParams> {
        self.orders
            .iter()
            .map(|o| OrderParams::buy(token_id, o.price, o.size))
            .collect()
    }

    /// Number of rungs.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Always false for a validated plan.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Build a ladder of equal-size buys, one per scheduled price.
///
/// Every price must lie strictly inside (0, 1), the size must be positive
/// and the schedule non-empty.
pub fn plan(prices: &[Decimal], size_per_step: Decimal) -> Result<LadderPlan, PlanError> {
    if prices.is_empty() {
        return Err(PlanError::EmptySchedule);
    }
    if size_per_step <= Decimal::ZERO {
        return Err(PlanError::InvalidSize(size_per_step));
    }
    if let Some(&price) = prices
        .iter()
        .find(|&&p| p <= Decimal::ZERO || p >= Decimal::ONE)
    {
        return Err(PlanError::PriceOutOfRange { price });
    }

    let orders: Vec<PlannedOrder> = prices
        .iter()
        .map(|&price| PlannedOrder {
            price,
            size: size_per_step,
        })
        .collect();
    let max_cost = orders.iter().map(PlannedOrder::cost).sum();

    Ok(LadderPlan { orders, max_cost })
}
