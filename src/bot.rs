//! One trading session from market identifier to DONE.

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::Result;
use crate::gateway::{MarketSource, OrderBookReader, OrderGateway};
use crate::ladder::{self, ExecutionSummary};
use crate::monitor::{self, MonitorOutcome, MonitorSession, MonitorSettings, PositionMonitor};

/// Ladder and exit parameters shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub ladder_prices: Vec<Decimal>,
    pub size_per_step: Decimal,
    pub profit_multiple: Decimal,
    /// Limit price of the liquidation sell.
    pub exit_price: Decimal,
    pub monitor: MonitorSettings,
}

impl Strategy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ladder_prices: config.ladder_prices.clone(),
            size_per_step: config.size_per_step,
            profit_multiple: config.profit_multiple,
            exit_price: config.exit_price,
            monitor: config.monitor_settings(),
        }
    }
}

/// Per-session choices, usually from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Minimum minutes the market must stay open.
    pub time_threshold_minutes: i64,
    /// Which outcome token to trade.
    pub outcome_index: usize,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            time_threshold_minutes: config.time_threshold_minutes,
            outcome_index: config.outcome_index,
        }
    }
}

/// Everything one session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub market_slug: String,
    pub token_id: String,
    /// Whether the market had enough time left to trade.
    pub time_gate_passed: bool,
    /// Ladder submission result; `None` when the time gate blocked trading.
    pub execution: Option<ExecutionSummary>,
    /// How monitoring ended; `None` when the time gate blocked trading.
    pub outcome: Option<MonitorOutcome>,
}

impl SessionReport {
    /// True if the session never placed an order.
    pub fn skipped(&self) -> bool {
        !self.time_gate_passed
    }
}

/// Runs ladder sessions against a venue.
pub struct LadderBot<G> {
    gateway: G,
    strategy: Strategy,
}

impl<G> LadderBot<G>
where
    G: MarketSource + OrderBookReader + OrderGateway,
{
    pub fn new(gateway: G, strategy: Strategy) -> Self {
        Self { gateway, strategy }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Resolve, gate, place the ladder and monitor until DONE.
    pub async fn run(&self, identifier: &str, options: SessionOptions) -> Result<SessionReport> {
        self.run_at(identifier, options, OffsetDateTime::now_utc()).await
    }

    /// [`LadderBot::run`] with the time gate evaluated at `now`.
    #[instrument(skip(self, options, now), fields(identifier = %identifier))]
    pub async fn run_at(
        &self,
        identifier: &str,
        options: SessionOptions,
        now: OffsetDateTime,
    ) -> Result<SessionReport> {
        // Bad schedules fail before any network call.
        let plan = ladder::plan(&self.strategy.ladder_prices, self.strategy.size_per_step)?;

        let market = self.gateway.resolve_market(identifier).await?;
        let token = market.token(options.outcome_index)?;
        info!(
            slug = %market.slug,
            condition_id = %market.condition_id,
            token_id = %token.token_id,
            outcome = %token.outcome,
            time_remaining = %market.time_remaining_str(),
            "Market resolved"
        );

        let mut report = SessionReport {
            market_slug: market.slug.clone(),
            token_id: token.token_id.clone(),
            time_gate_passed: false,
            execution: None,
            outcome: None,
        };

        if !monitor::has_sufficient_time_at(&market, options.time_threshold_minutes, now) {
            warn!(
                threshold_minutes = options.time_threshold_minutes,
                "Not enough time left before close; skipping"
            );
            return Ok(report);
        }
        report.time_gate_passed = true;

        let execution = ladder::execute(&self.gateway, &plan, &token.token_id).await;
        let mut session = MonitorSession::new(
            token.token_id.clone(),
            execution.max_cost,
            self.strategy.profit_multiple,
        );
        report.execution = Some(execution);

        let outcome = PositionMonitor::new(&self.gateway, self.strategy.monitor, self.strategy.exit_price)
            .run(&mut session)
            .await?;
        info!(polls = outcome.polls(), exited = outcome.exited(), "Session complete");
        report.outcome = Some(outcome);

        Ok(report)
    }
}
