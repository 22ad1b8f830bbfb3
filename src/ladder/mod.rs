//! Entry ladder: planning staggered limit buys and placing them.
//!
//! - [`planner`]: pure construction of the order set and its maximum cost
//! - [`executor`]: partial-failure tolerant submission of a plan

pub mod executor;
pub mod planner;

pub use executor::{execute, ExecutionSummary};
pub use planner::{plan, LadderPlan, PlannedOrder};
