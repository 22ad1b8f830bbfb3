//! Monitor session state and the poll decision.

use rust_decimal::Decimal;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::orderbook::OrderBook;
use crate::trading::{OpenOrder, Position};

/// Lifecycle of one monitored position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Waiting for fills or for the profit target.
    Active,
    /// Liquidation in progress.
    Exiting,
    /// Terminal.
    Done,
}

/// What one poll saw.
#[derive(Debug, Clone)]
pub enum Observation {
    /// Nothing held; the resting orders on the token.
    Flat { open_orders: Vec<OpenOrder> },
    /// Shares held and the book to value them against.
    Holding { balance: Decimal, book: OrderBook },
}

/// What the driver should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing held and nothing resting.
    Finish,
    /// Nothing held yet but orders are still resting.
    WaitForFill,
    /// Holding, but the book cannot price the position.
    WaitForQuotes,
    /// Holding below target.
    Hold { value: Decimal, target: Decimal },
    /// Target reached; sell `amount`.
    Exit {
        amount: Decimal,
        value: Decimal,
        target: Decimal,
    },
}

/// One token's monitoring session.
///
/// The target is fixed when the session is created from the ladder's
/// maximum cost, regardless of which rungs actually fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSession {
    token_id: String,
    max_cost: Decimal,
    profit_multiple: Decimal,
    target: Decimal,
    state: SessionState,
}

impl MonitorSession {
    pub fn new(token_id: impl Into<String>, max_cost: Decimal, profit_multiple: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            max_cost,
            profit_multiple,
            target: max_cost * profit_multiple,
            state: SessionState::Active,
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn max_cost(&self) -> Decimal {
        self.max_cost
    }

    pub fn profit_multiple(&self) -> Decimal {
        self.profit_multiple
    }

    /// Position value at which the session exits.
    pub fn target(&self) -> Decimal {
        self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    /// Decide the next step from one observation. Pure.
    ///
    /// Only an active session acts; any other state decides [`Decision::Finish`].
    pub fn decide(&self, observation: &Observation) -> Decision {
        if self.state != SessionState::Active {
            return Decision::Finish;
        }

        match observation {
            Observation::Flat { open_orders } if open_orders.is_empty() => Decision::Finish,
            Observation::Flat { .. } => Decision::WaitForFill,
            Observation::Holding { balance, .. } if *balance <= Decimal::ZERO => {
                Decision::WaitForFill
            }
            Observation::Holding { balance, book } => match Position::mark(book, *balance) {
                Err(_) => Decision::WaitForQuotes,
                Ok(position) => {
                    let value = position.current_value();
                    if value >= self.target {
                        Decision::Exit {
                            amount: *balance,
                            value,
                            target: self.target,
                        }
                    } else {
                        Decision::Hold {
                            value,
                            target: self.target,
                        }
                    }
                }
            },
        }
    }

    /// Apply the state change a decision implies.
    pub fn apply(&mut self, decision: &Decision) {
        match decision {
            Decision::Finish => self.state = SessionState::Done,
            Decision::Exit { .. } => self.state = SessionState::Exiting,
            _ => {}
        }
    }

    /// Mark liquidation as finished.
    pub fn complete_exit(&mut self) {
        if self.state == SessionState::Exiting {
            self.state = SessionState::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn session() -> MonitorSession {
        MonitorSession::new("tok", dec!(6), dec!(1.3))
    }

    fn book(bid: Option<Decimal>, ask: Option<Decimal>) -> OrderBook {
        OrderBook::new(
            "tok",
            bid.map(|p| PriceLevel::new(p, dec!(100))).into_iter().collect(),
            ask.map(|p| PriceLevel::new(p, dec!(100))).into_iter().collect(),
        )
    }

    #[test]
    fn target_fixed_at_creation() {
        let s = session();
        assert_eq!(s.target(), dec!(7.8));
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.state().to_string(), "ACTIVE");
    }

    #[test]
    fn flat_with_nothing_resting_finishes() {
        let decision = session().decide(&Observation::Flat {
            open_orders: Vec::new(),
        });
        assert_eq!(decision, Decision::Finish);
    }

    #[test]
    fn flat_with_resting_orders_waits() {
        let decision = session().decide(&Observation::Flat {
            open_orders: vec![OpenOrder::with_id("0x1")],
        });
        assert_eq!(decision, Decision::WaitForFill);
    }

    #[test]
    fn one_sided_book_waits_for_quotes() {
        let s = session();
        for b in [
            book(Some(dec!(0.45)), None),
            book(None, Some(dec!(0.5))),
            book(None, None),
        ] {
            let decision = s.decide(&Observation::Holding {
                balance: dec!(100),
                book: b,
            });
            assert_eq!(decision, Decision::WaitForQuotes);
        }
    }

    #[test]
    fn exits_when_value_reaches_target() {
        let decision = session().decide(&Observation::Holding {
            balance: dec!(100),
            book: book(Some(dec!(0.45)), Some(dec!(0.46))),
        });
        assert_eq!(
            decision,
            Decision::Exit {
                amount: dec!(100),
                value: dec!(45),
                target: dec!(7.8),
            }
        );
    }

    #[test]
    fn exit_is_inclusive_of_target() {
        let decision = session().decide(&Observation::Holding {
            balance: dec!(78),
            book: book(Some(dec!(0.10)), Some(dec!(0.11))),
        });
        assert!(matches!(decision, Decision::Exit { .. }));
    }

    #[test]
    fn holds_below_target() {
        let decision = session().decide(&Observation::Holding {
            balance: dec!(10),
            book: book(Some(dec!(0.30)), Some(dec!(0.31))),
        });
        assert_eq!(
            decision,
            Decision::Hold {
                value: dec!(3),
                target: dec!(7.8),
            }
        );
    }

    #[test]
    fn transitions() {
        let mut s = session();
        let exit = Decision::Exit {
            amount: dec!(1),
            value: dec!(10),
            target: dec!(7.8),
        };
        s.apply(&Decision::Hold {
            value: dec!(1),
            target: dec!(7.8),
        });
        assert_eq!(s.state(), SessionState::Active);

        s.apply(&exit);
        assert_eq!(s.state(), SessionState::Exiting);
        // an exiting session never decides to exit again
        assert_eq!(
            s.decide(&Observation::Flat {
                open_orders: Vec::new()
            }),
            Decision::Finish
        );

        s.complete_exit();
        assert!(s.is_done());
    }
}
