//! Scripted in-memory gateway for tests.
//!
//! Balances and books can be scripted call by call; once a script runs out
//! the configured default is returned. Accepted orders rest as open orders
//! until cancelled, and every submission and cancel attempt is recorded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{MarketSource, OrderBookReader, OrderGateway};
use crate::error::{MarketError, TradingError};
use crate::market::Market;
use crate::orderbook::{OrderBook, PriceLevel};
use crate::trading::{OpenOrder, OrderAck, OrderParams, Side};

/// How the mock answers one order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBehavior {
    /// Venue accepts and assigns an id.
    Accept,
    /// Venue answers with `success: false`.
    Reject(String),
    /// Transport or HTTP failure.
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    markets: HashMap<String, Market>,
    balance: Decimal,
    balance_script: VecDeque<Result<Decimal, String>>,
    books: HashMap<String, OrderBook>,
    book_script: VecDeque<Result<OrderBook, String>>,
    open_orders: Vec<OpenOrder>,
    fail_open_orders: bool,
    submit_script: VecDeque<SubmitBehavior>,
    cancel_failures: HashSet<String>,
    submitted: Vec<OrderParams>,
    cancel_attempts: Vec<String>,
    balance_calls: usize,
    book_calls: usize,
    next_id: u64,
}

/// Mock venue implementing every collaborator trait.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Empty venue: zero balance, no books, no orders.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a market under its slug and condition id.
    pub fn add_market(&self, market: Market) {
        let mut state = self.state();
        state.markets.insert(market.condition_id.clone(), market.clone());
        state.markets.insert(market.slug.clone(), market);
    }

    /// Balance returned once any scripted balances are used up.
    pub fn set_balance(&self, balance: Decimal) {
        self.state().balance = balance;
    }

    /// Queue the result of the next unscripted balance call.
    pub fn push_balance(&self, balance: Decimal) {
        self.state().balance_script.push_back(Ok(balance));
    }

    /// Queue a failing balance call.
    pub fn push_balance_error(&self, reason: impl Into<String>) {
        self.state().balance_script.push_back(Err(reason.into()));
    }

    /// Book returned for its token once scripted books are used up.
    pub fn set_order_book(&self, book: OrderBook) {
        self.state().books.insert(book.token_id.clone(), book);
    }

    /// Queue the next book snapshot, for any token.
    pub fn push_order_book(&self, book: OrderBook) {
        self.state().book_script.push_back(Ok(book));
    }

    /// Queue a failing book fetch.
    pub fn push_book_error(&self, reason: impl Into<String>) {
        self.state().book_script.push_back(Err(reason.into()));
    }

    /// Add a resting order.
    pub fn add_open_order(&self, order: OpenOrder) {
        self.state().open_orders.push(order);
    }

    /// Remove every resting order, as if all had filled.
    pub fn fill_all_open_orders(&self) {
        self.state().open_orders.clear();
    }

    /// Make every open-orders listing fail.
    pub fn set_fail_open_orders(&self, fail: bool) {
        self.state().fail_open_orders = fail;
    }

    /// Script the next submissions in order; later ones are accepted.
    pub fn script_submissions(&self, behaviors: impl IntoIterator<Item = SubmitBehavior>) {
        self.state().submit_script.extend(behaviors);
    }

    /// Make cancelling `order_id` fail.
    pub fn fail_cancel(&self, order_id: impl Into<String>) {
        self.state().cancel_failures.insert(order_id.into());
    }

    /// Every submission attempt, in order.
    pub fn submitted(&self) -> Vec<OrderParams> {
        self.state().submitted.clone()
    }

    /// Submission attempts on one side.
    pub fn submitted_on(&self, side: Side) -> Vec<OrderParams> {
        self.submitted().into_iter().filter(|o| o.side == side).collect()
    }

    /// Every cancel attempt, in order.
    pub fn cancel_attempts(&self) -> Vec<String> {
        self.state().cancel_attempts.clone()
    }

    /// Orders still resting.
    pub fn resting_orders(&self) -> Vec<OpenOrder> {
        self.state().open_orders.clone()
    }

    /// Number of balance queries served.
    pub fn balance_calls(&self) -> usize {
        self.state().balance_calls
    }

    /// Number of book fetches served.
    pub fn book_calls(&self) -> usize {
        self.state().book_calls
    }
}

#[async_trait]
impl MarketSource for MockGateway {
    async fn resolve_market(&self, identifier: &str) -> Result<Market, MarketError> {
        self.state()
            .markets
            .get(identifier)
            .cloned()
            .ok_or_else(|| MarketError::NotFound {
                identifier: identifier.to_string(),
            })
    }
}

#[async_trait]
impl OrderBookReader for MockGateway {
    async fn order_book(&self, token_id: &str) -> Result<OrderBook, TradingError> {
        let mut state = self.state();
        state.book_calls += 1;
        match state.book_script.pop_front() {
            Some(Ok(book)) => Ok(book),
            Some(Err(reason)) => Err(TradingError::gateway("order_book", reason)),
            None => Ok(state
                .books
                .get(token_id)
                .cloned()
                .unwrap_or_else(|| OrderBook::empty(token_id))),
        }
    }
}

#[async_trait]
impl OrderGateway for MockGateway {
    async fn balance(&self, _token_id: &str) -> Result<Decimal, TradingError> {
        let mut state = self.state();
        state.balance_calls += 1;
        match state.balance_script.pop_front() {
            Some(Ok(balance)) => Ok(balance),
            Some(Err(reason)) => Err(TradingError::gateway("balance", reason)),
            None => Ok(state.balance),
        }
    }

    async fn open_orders(&self, token_id: &str) -> Result<Vec<OpenOrder>, TradingError> {
        let state = self.state();
        if state.fail_open_orders {
            return Err(TradingError::gateway("open_orders", "mock open orders failure"));
        }
        Ok(state
            .open_orders
            .iter()
            .filter(|o| o.token_id.as_deref().map_or(true, |t| t == token_id))
            .cloned()
            .collect())
    }

    async fn submit_order(&self, params: &OrderParams) -> Result<OrderAck, TradingError> {
        let mut state = self.state();
        state.submitted.push(params.clone());

        match state.submit_script.pop_front().unwrap_or(SubmitBehavior::Accept) {
            SubmitBehavior::Accept => {
                state.next_id += 1;
                let order_id = format!("0xmock{}", state.next_id);
                if params.side == Side::Buy {
                    state.open_orders.push(OpenOrder {
                        id: order_id.clone(),
                        token_id: Some(params.token_id.clone()),
                        side: Some(params.side),
                        price: Some(params.price),
                    });
                }
                Ok(OrderAck::accepted(order_id))
            }
            SubmitBehavior::Reject(reason) => Ok(OrderAck::rejected(reason)),
            SubmitBehavior::Fail(reason) => Err(TradingError::SubmissionFailed(reason)),
        }
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), TradingError> {
        let mut state = self.state();
        state.cancel_attempts.push(order_id.to_string());
        if state.cancel_failures.contains(order_id) {
            return Err(TradingError::CancelFailed {
                order_id: order_id.to_string(),
                reason: "mock cancel failure".to_string(),
            });
        }
        state.open_orders.retain(|o| o.id != order_id);
        Ok(())
    }
}

/// Builder for order books with common shapes.
pub struct BookBuilder {
    token_id: String,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

impl BookBuilder {
    /// Create a new builder for the given token.
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    /// Add a bid level.
    pub fn bid(mut self, price: Decimal, size: Decimal) -> Self {
        self.bids.push(PriceLevel::new(price, size));
        self
    }

    /// Add an ask level.
    pub fn ask(mut self, price: Decimal, size: Decimal) -> Self {
        self.asks.push(PriceLevel::new(price, size));
        self
    }

    /// One level each side at the given prices.
    pub fn with_spread(self, best_bid: Decimal, best_ask: Decimal, depth: Decimal) -> Self {
        self.bid(best_bid, depth).ask(best_ask, depth)
    }

    /// Build the book, best prices first.
    pub fn build(self) -> OrderBook {
        OrderBook::new(self.token_id, self.bids, self.asks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn balance_script_then_default() {
        let gateway = MockGateway::new();
        gateway.set_balance(dec!(5));
        gateway.push_balance_error("timeout");
        gateway.push_balance(dec!(1));

        assert!(gateway.balance("t").await.is_err());
        assert_eq!(gateway.balance("t").await.unwrap(), dec!(1));
        assert_eq!(gateway.balance("t").await.unwrap(), dec!(5));
        assert_eq!(gateway.balance_calls(), 3);
    }

    #[tokio::test]
    async fn accepted_buys_rest_until_cancelled() {
        let gateway = MockGateway::new();
        let ack = gateway
            .submit_order(&OrderParams::buy("t", dec!(0.1), dec!(10)))
            .await
            .unwrap();
        let id = ack.accepted_id().unwrap().to_string();

        assert_eq!(gateway.open_orders("t").await.unwrap().len(), 1);
        gateway.cancel_order(&id).await.unwrap();
        assert!(gateway.open_orders("t").await.unwrap().is_empty());
        assert_eq!(gateway.cancel_attempts(), vec![id]);
    }

    #[tokio::test]
    async fn scripted_submissions() {
        let gateway = MockGateway::new();
        gateway.script_submissions([
            SubmitBehavior::Reject("no".to_string()),
            SubmitBehavior::Fail("down".to_string()),
        ]);
        let params = OrderParams::buy("t", dec!(0.1), dec!(10));

        assert!(!gateway.submit_order(&params).await.unwrap().success);
        assert!(gateway.submit_order(&params).await.is_err());
        assert!(gateway.submit_order(&params).await.unwrap().success);
        assert_eq!(gateway.submitted().len(), 3);
    }

    #[test]
    fn unknown_token_gets_empty_book() {
        let gateway = MockGateway::new();
        let book = tokio_test::block_on(gateway.order_book("nobody")).unwrap();
        assert!(book.bids.is_empty() && book.asks.is_empty());
    }

    #[test]
    fn book_builder_sorts() {
        let book = BookBuilder::new("test-token")
            .bid(dec!(0.49), dec!(200))
            .bid(dec!(0.50), dec!(100))
            .ask(dec!(0.53), dec!(200))
            .ask(dec!(0.52), dec!(100))
            .build();

        assert_eq!(book.best_bid(), Some(dec!(0.50)));
        assert_eq!(book.best_ask(), Some(dec!(0.52)));
    }
}
