//! Position snapshots.

use rust_decimal::Decimal;

use crate::error::TradingError;
use crate::orderbook::OrderBook;

/// Held position in a single token, valued against the current book.
///
/// Computed fresh on every poll; nothing about it is stored between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Token ID.
    pub token_id: String,
    /// Number of shares held.
    pub size: Decimal,
    /// Best bid used for valuation.
    pub mark_price: Decimal,
}

impl Position {
    /// Value a held balance at the best bid of `book`.
    ///
    /// Both book sides must be present; a one-sided book cannot price the position.
    pub fn mark(book: &OrderBook, size: Decimal) -> Result<Self, TradingError> {
        if book.asks.is_empty() {
            return Err(TradingError::QuoteUnavailable {
                token_id: book.token_id.clone(),
                side: "ask",
            });
        }
        let mark_price = book.best_bid().ok_or_else(|| TradingError::QuoteUnavailable {
            token_id: book.token_id.clone(),
            side: "bid",
        })?;

        Ok(Self {
            token_id: book.token_id.clone(),
            size,
            mark_price,
        })
    }

    /// Liquidation value at the mark price.
    pub fn current_value(&self) -> Decimal {
        self.size * self.mark_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;
    use rust_decimal_macros::dec;

    fn book(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> OrderBook {
        OrderBook::new("token", bids, asks)
    }

    #[test]
    fn marks_at_best_bid() {
        let book = book(
            vec![
                PriceLevel::new(dec!(0.45), dec!(10)),
                PriceLevel::new(dec!(0.40), dec!(10)),
            ],
            vec![PriceLevel::new(dec!(0.50), dec!(10))],
        );
        let pos = Position::mark(&book, dec!(100)).unwrap();

        assert_eq!(pos.mark_price, dec!(0.45));
        assert_eq!(pos.current_value(), dec!(45));
    }

    #[test]
    fn missing_side_is_quote_unavailable() {
        let no_bids = book(vec![], vec![PriceLevel::new(dec!(0.50), dec!(10))]);
        assert!(matches!(
            Position::mark(&no_bids, dec!(1)),
            Err(TradingError::QuoteUnavailable { side: "bid", .. })
        ));

        let no_asks = book(vec![PriceLevel::new(dec!(0.45), dec!(10))], vec![]);
        assert!(matches!(
            Position::mark(&no_asks, dec!(1)),
            Err(TradingError::QuoteUnavailable { side: "ask", .. })
        ));
    }
}
