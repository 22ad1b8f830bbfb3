//! Polymarket ladder-entry and take-profit bot.
//!
//! A session resolves one binary market, checks that it stays open long
//! enough, places a ladder of limit buys on one outcome and then polls the
//! position until its value reaches a fixed multiple of the ladder cost,
//! at which point every resting order is cancelled and the position sold.
//!
//! ```text
//! ladder:  10 @ $0.10 + 10 @ $0.20 + 10 @ $0.30
//! cost:    $6.00 if every rung fills
//! target:  $6.00 x 1.3 = $7.80 of position value at the best bid
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market resolution, search and the Polymarket client
//! - [`orderbook`]: Order book snapshots
//! - [`trading`]: Order types, positions and order HTTP calls
//! - [`gateway`]: Collaborator traits and the test mock
//! - [`ladder`]: Ladder planning and submission
//! - [`monitor`]: Time gate, position monitor and liquidation
//! - [`bot`]: Session orchestration

pub mod bot;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ladder;
pub mod market;
pub mod metrics;
pub mod monitor;
pub mod orderbook;
pub mod signing;
pub mod trading;

pub use bot::{LadderBot, SessionOptions, SessionReport, Strategy};
pub use config::Config;
pub use error::{BotError, Result};
