//! Market module for binary prediction markets.
//!
//! This module handles:
//! - Market types and data structures
//! - Market resolution (slug or URL to merged Gamma/CLOB metadata)
//! - Keyword search over the market listing
//! - Polymarket API client

pub mod client;
pub mod resolve;
pub mod search;
pub mod types;

pub use client::PolymarketClient;
pub use resolve::{resolve_market, slug_from_url};
pub use search::{search_markets, KeywordMatcher, ListedMarket};
pub use types::{parse_outcome_index, Market, Outcome, OutcomeToken};
