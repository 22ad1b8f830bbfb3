//! Position monitoring after the ladder is placed.
//!
//! The [`time_gate`] runs once before any order goes out. After that a
//! [`MonitorSession`] is polled by [`PositionMonitor`] until it is DONE,
//! liquidating through [`liquidate`] when the profit target is reached.

pub mod driver;
pub mod liquidation;
pub mod session;
pub mod time_gate;

use std::time::Duration;

pub use driver::{MonitorOutcome, PositionMonitor};
pub use liquidation::{liquidate, LiquidationReport};
pub use session::{Decision, MonitorSession, Observation, SessionState};
pub use time_gate::{has_sufficient_time, has_sufficient_time_at};

/// Poll loop timing and optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Sleep between regular polls.
    pub poll_interval: Duration,
    /// Shorter sleep while waiting for fills or quotes.
    pub wait_interval: Duration,
    /// Give up after this many consecutive failed polls.
    pub max_consecutive_errors: Option<u32>,
    /// Give up after monitoring this long.
    pub max_duration: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            wait_interval: Duration::from_secs(10),
            max_consecutive_errors: None,
            max_duration: None,
        }
    }
}
