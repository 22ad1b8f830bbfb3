//! Order book types for pricing a held position.

pub mod types;

pub use types::{OrderBook, PriceLevel};
