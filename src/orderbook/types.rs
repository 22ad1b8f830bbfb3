//! Order book types and data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Single price level in an order book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Total size available at this price.
    pub size: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// L2 order book snapshot for one outcome token.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Token ID this book represents.
    pub token_id: String,
    /// Bid levels sorted by price descending.
    pub bids: Vec<PriceLevel>,
    /// Ask levels sorted by price ascending.
    pub asks: Vec<PriceLevel>,
    /// When this snapshot was taken.
    pub updated_at: OffsetDateTime,
}

impl OrderBook {
    /// Build a book from unsorted levels, putting the best price first on each side.
    pub fn new(
        token_id: impl Into<String>,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            token_id: token_id.into(),
            bids,
            asks,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Empty book for a token.
    pub fn empty(token_id: impl Into<String>) -> Self {
        Self::new(token_id, Vec::new(), Vec::new())
    }

    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Get the best ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Both sides have at least one level.
    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Midpoint of best bid and best ask.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Get the spread between best bid and ask.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get total liquidity on the bid side.
    pub fn total_bid_liquidity(&self) -> Decimal {
        self.bids.iter().map(|l| l.size).sum()
    }
}
