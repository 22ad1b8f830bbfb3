//! Poll loop around [`MonitorSession::decide`].

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use super::liquidation::{liquidate, LiquidationReport};
use super::session::{Decision, MonitorSession, Observation};
use super::MonitorSettings;
use crate::error::{MonitorError, TradingError};
use crate::gateway::{OrderBookReader, OrderGateway};
use crate::metrics;

/// How a monitoring run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Nothing held and nothing resting.
    Finished { polls: u32 },
    /// Profit target reached and the position was liquidated.
    Exited {
        polls: u32,
        amount: Decimal,
        value: Decimal,
        target: Decimal,
        liquidation: LiquidationReport,
    },
}

impl MonitorOutcome {
    /// Number of polls the run took.
    pub fn polls(&self) -> u32 {
        match self {
            MonitorOutcome::Finished { polls } | MonitorOutcome::Exited { polls, .. } => *polls,
        }
    }

    pub fn exited(&self) -> bool {
        matches!(self, MonitorOutcome::Exited { .. })
    }
}

/// Drives a [`MonitorSession`] against the venue until it is done.
pub struct PositionMonitor<'a, G: ?Sized> {
    gateway: &'a G,
    settings: MonitorSettings,
    exit_price: Decimal,
}

impl<'a, G> PositionMonitor<'a, G>
where
    G: OrderGateway + OrderBookReader + ?Sized,
{
    pub fn new(gateway: &'a G, settings: MonitorSettings, exit_price: Decimal) -> Self {
        Self {
            gateway,
            settings,
            exit_price,
        }
    }

    /// Poll until the session reaches DONE.
    ///
    /// Gateway errors are retried on the next poll. The run only fails when
    /// a configured error or duration bound is exceeded; without bounds it
    /// keeps polling indefinitely.
    #[instrument(skip(self, session), fields(token_id = %session.token_id(), target = %session.target()))]
    pub async fn run(&self, session: &mut MonitorSession) -> Result<MonitorOutcome, MonitorError> {
        let started = Instant::now();
        let mut polls = 0u32;
        let mut consecutive_errors = 0u32;

        info!(
            max_cost = %session.max_cost(),
            profit_multiple = %session.profit_multiple(),
            "Monitoring position"
        );

        loop {
            polls += 1;
            metrics::inc_monitor_polls();

            let observation = match self.observe(session.token_id()).await {
                Ok(observation) => {
                    consecutive_errors = 0;
                    observation
                }
                Err(e) => {
                    consecutive_errors += 1;
                    metrics::inc_monitor_errors();
                    warn!(error = %e, consecutive_errors, "Monitor poll failed; retrying");
                    if let Some(max) = self.settings.max_consecutive_errors {
                        if consecutive_errors >= max {
                            return Err(MonitorError::RetryLimitExceeded {
                                attempts: consecutive_errors,
                            });
                        }
                    }
                    self.pause(self.settings.poll_interval, started).await?;
                    continue;
                }
            };

            let decision = session.decide(&observation);
            session.apply(&decision);

            match decision {
                Decision::Finish => {
                    info!(polls, "No position and no open orders; done");
                    return Ok(MonitorOutcome::Finished { polls });
                }
                Decision::WaitForFill => {
                    debug!("Orders still resting; waiting for fills");
                    self.pause(self.settings.wait_interval, started).await?;
                }
                Decision::WaitForQuotes => {
                    debug!("Book is one-sided; waiting for quotes");
                    self.pause(self.settings.wait_interval, started).await?;
                }
                Decision::Hold { value, target } => {
                    info!(%value, %target, "Holding below target");
                    self.pause(self.settings.poll_interval, started).await?;
                }
                Decision::Exit {
                    amount,
                    value,
                    target,
                } => {
                    info!(%amount, %value, %target, "Profit target reached; liquidating");
                    let liquidation =
                        liquidate(self.gateway, session.token_id(), amount, self.exit_price).await;
                    session.complete_exit();
                    return Ok(MonitorOutcome::Exited {
                        polls,
                        amount,
                        value,
                        target,
                        liquidation,
                    });
                }
            }
        }
    }

    /// Gather one observation: open orders when flat, the book when holding.
    async fn observe(&self, token_id: &str) -> Result<Observation, TradingError> {
        let balance = self.gateway.balance(token_id).await?;
        if balance <= Decimal::ZERO {
            let open_orders = self.gateway.open_orders(token_id).await?;
            debug!(open = open_orders.len(), "No balance yet");
            return Ok(Observation::Flat { open_orders });
        }

        let book = self.gateway.order_book(token_id).await?;
        debug!(
            %balance,
            best_bid = ?book.best_bid(),
            mid = ?book.mid_price(),
            spread = ?book.spread(),
            bid_depth = %book.total_bid_liquidity(),
            "Position snapshot"
        );
        Ok(Observation::Holding { balance, book })
    }

    async fn pause(&self, interval: Duration, started: Instant) -> Result<(), MonitorError> {
        sleep(interval).await;
        match self.settings.max_duration {
            Some(limit) if started.elapsed() >= limit => {
                Err(MonitorError::DurationExceeded { limit })
            }
            _ => Ok(()),
        }
    }
}
