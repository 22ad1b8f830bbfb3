//! Pre-trade check that the market stays open long enough.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::market::Market;

/// True only if `market` closes more than `threshold_minutes` after `now`.
///
/// The granular close time is preferred, falling back to the coarse one.
/// A market with no close time at all never passes.
pub fn has_sufficient_time_at(market: &Market, threshold_minutes: i64, now: OffsetDateTime) -> bool {
    let Some(remaining) = market.time_remaining_at(now) else {
        warn!(slug = %market.slug, "Market has no close time; refusing to trade");
        return false;
    };

    let remaining_minutes = remaining.as_seconds_f64() / 60.0;
    let sufficient = remaining_minutes > threshold_minutes as f64;
    info!(
        slug = %market.slug,
        remaining_minutes = format!("{:.1}", remaining_minutes),
        threshold_minutes,
        sufficient,
        "Time gate evaluated"
    );
    sufficient
}

/// [`has_sufficient_time_at`] against the current wall clock.
pub fn has_sufficient_time(market: &Market, threshold_minutes: i64) -> bool {
    has_sufficient_time_at(market, threshold_minutes, OffsetDateTime::now_utc())
}
