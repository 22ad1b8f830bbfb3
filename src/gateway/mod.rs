//! Collaborator traits the ladder engine calls.
//!
//! The engine never talks HTTP itself. [`PolymarketClient`] implements all
//! three traits against the live venue; [`mock::MockGateway`] scripts them
//! for tests.

pub mod mock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{MarketError, TradingError};
use crate::market::{self, Market, PolymarketClient};
use crate::orderbook::OrderBook;
use crate::trading::{self, OpenOrder, OrderAck, OrderParams};

/// Resolves a market identifier to its metadata.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Resolve a slug or condition id.
    async fn resolve_market(&self, identifier: &str) -> Result<Market, MarketError>;
}

/// Reads the current order book for a token.
#[async_trait]
pub trait OrderBookReader: Send + Sync {
    /// Book snapshot with bids descending and asks ascending.
    async fn order_book(&self, token_id: &str) -> Result<OrderBook, TradingError>;
}

/// Places, lists and cancels orders and reports token balances.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Shares of `token_id` currently held.
    async fn balance(&self, token_id: &str) -> Result<Decimal, TradingError>;

    /// Resting orders for `token_id`.
    async fn open_orders(&self, token_id: &str) -> Result<Vec<OpenOrder>, TradingError>;

    /// Submit a limit order.
    async fn submit_order(&self, params: &OrderParams) -> Result<OrderAck, TradingError>;

    /// Cancel one order.
    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError>;
}

#[async_trait]
impl MarketSource for PolymarketClient {
    async fn resolve_market(&self, identifier: &str) -> Result<Market, MarketError> {
        market::resolve_market(self, identifier).await
    }
}

#[async_trait]
impl OrderBookReader for PolymarketClient {
    async fn order_book(&self, token_id: &str) -> Result<OrderBook, TradingError> {
        self.get_order_book(token_id).await
    }
}

#[async_trait]
impl OrderGateway for PolymarketClient {
    async fn balance(&self, token_id: &str) -> Result<Decimal, TradingError> {
        self.get_token_balance(token_id).await
    }

    async fn open_orders(&self, token_id: &str) -> Result<Vec<OpenOrder>, TradingError> {
        trading::get_open_orders(self, token_id).await
    }

    async fn submit_order(&self, params: &OrderParams) -> Result<OrderAck, TradingError> {
        trading::submit_order(self, params).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError> {
        trading::cancel_order(self, order_id).await
    }
}
