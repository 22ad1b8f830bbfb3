//! Trading module for order management and execution.
//!
//! This module handles:
//! - Order types and venue acknowledgements
//! - The authenticated CLOB session
//! - Order submission, listing and cancellation
//! - Position snapshots

pub mod clob;
pub mod execution;
pub mod order;
pub mod position;

pub use clob::ClobSession;
pub use execution::{cancel_order, get_open_orders, submit_order};
pub use order::{OpenOrder, OrderAck, OrderParams, OrderType, PlacedOrder, Side};
pub use position::Position;
