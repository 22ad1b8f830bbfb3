//! Order types and creation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    #[strum(serialize = "BUY", serialize = "buy")]
    Buy,
    /// Sell order.
    #[strum(serialize = "SELL", serialize = "sell")]
    Sell,
}

/// Order type as understood by the CLOB.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Good-till-cancelled: rests on the book until filled or cancelled.
    #[default]
    #[strum(serialize = "GTC", serialize = "gtc")]
    GTC,
    /// Fill-or-kill: must fill entirely or cancel.
    #[strum(serialize = "FOK", serialize = "fok")]
    FOK,
}

/// Order parameters for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderParams {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side (buy/sell).
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order size.
    pub size: Decimal,
    /// Order type.
    pub order_type: OrderType,
}

impl OrderParams {
    /// Create a new resting buy order.
    pub fn buy(token_id: impl Into<String>, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side: Side::Buy,
            price,
            size,
            order_type: OrderType::GTC,
        }
    }

    /// Create a new resting sell order.
    pub fn sell(token_id: impl Into<String>, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side: Side::Sell,
            price,
            size,
            order_type: OrderType::GTC,
        }
    }

    /// Notional value at the limit price.
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }

    /// Validate order parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_id.is_empty() {
            return Err("token_id is required".to_string());
        }
        if self.price <= Decimal::ZERO || self.price >= Decimal::ONE {
            return Err("price must be strictly between 0 and 1".to_string());
        }
        if self.size <= Decimal::ZERO {
            return Err("size must be positive".to_string());
        }
        Ok(())
    }
}

/// Gateway acknowledgement of an order submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderAck {
    /// Whether the venue accepted the order.
    #[serde(default)]
    pub success: bool,
    /// Order ID assigned by the venue.
    #[serde(alias = "orderID", alias = "orderId", alias = "order_id", alias = "id")]
    pub order_id: Option<String>,
    /// Error message if any.
    #[serde(alias = "errorMsg", alias = "error")]
    pub error_msg: Option<String>,
}

impl OrderAck {
    /// Accepted order with the given id.
    pub fn accepted(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            order_id: Some(order_id.into()),
            error_msg: None,
        }
    }

    /// Rejected order with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            error_msg: Some(reason.into()),
        }
    }

    /// Order id when the submission succeeded.
    pub fn accepted_id(&self) -> Option<&str> {
        if self.success {
            self.order_id.as_deref().filter(|id| !id.is_empty())
        } else {
            None
        }
    }
}

/// Order that the venue accepted, with the parameters it was sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Order ID assigned by the venue.
    pub order_id: String,
    /// Limit price it was submitted at.
    pub price: Decimal,
    /// Size it was submitted with.
    pub size: Decimal,
}

/// Open (resting) order as listed by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenOrder {
    /// Order ID.
    #[serde(alias = "orderID", alias = "orderId", alias = "order_id")]
    pub id: String,
    /// Token the order is for.
    #[serde(default, alias = "asset_id")]
    pub token_id: Option<String>,
    /// Order side.
    #[serde(default)]
    pub side: Option<Side>,
    /// Limit price.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl OpenOrder {
    /// Open order with only an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token_id: None,
            side: None,
            price: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_params_creation() {
        let buy = OrderParams::buy("token-123", dec!(0.20), dec!(10));
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.order_type, OrderType::GTC);
        assert_eq!(buy.notional(), dec!(2.0));

        let sell = OrderParams::sell("token-456", dec!(0.01), dec!(5));
        assert_eq!(sell.side, Side::Sell);
        assert_eq!(sell.order_type, OrderType::GTC);
    }

    #[test]
    fn order_params_validation() {
        assert!(OrderParams::buy("token", dec!(0.50), dec!(10)).validate().is_ok());
        assert!(OrderParams::buy("", dec!(0.50), dec!(10)).validate().is_err());
        assert!(OrderParams::buy("token", dec!(0), dec!(10)).validate().is_err());
        assert!(OrderParams::buy("token", dec!(1), dec!(10)).validate().is_err());
        assert!(OrderParams::buy("token", dec!(0.50), dec!(-10)).validate().is_err());
    }

    #[test]
    fn order_ack_parses_venue_response() {
        let ack: OrderAck =
            serde_json::from_value(serde_json::json!({"success": true, "orderID": "0xabc"})).unwrap();
        assert_eq!(ack.accepted_id(), Some("0xabc"));

        let ack: OrderAck = serde_json::from_value(
            serde_json::json!({"success": false, "errorMsg": "not enough balance"}),
        )
        .unwrap();
        assert_eq!(ack.accepted_id(), None);
        assert_eq!(ack.error_msg.as_deref(), Some("not enough balance"));
    }

    #[test]
    fn ack_without_id_is_not_accepted() {
        let ack = OrderAck {
            success: true,
            order_id: Some(String::new()),
            error_msg: None,
        };
        assert_eq!(ack.accepted_id(), None);
    }

    #[test]
    fn open_order_parses_listing() {
        let order: OpenOrder = serde_json::from_value(serde_json::json!({
            "id": "0x1",
            "asset_id": "tok",
            "side": "BUY",
            "price": "0.2"
        }))
        .unwrap();
        assert_eq!(order.id, "0x1");
        assert_eq!(order.token_id.as_deref(), Some("tok"));
        assert_eq!(order.side, Some(Side::Buy));
        assert_eq!(order.price, Some(dec!(0.2)));
    }

    #[test]
    fn side_from_string() {
        use std::str::FromStr;
        assert_eq!(Side::from_str("buy").unwrap(), Side::Buy);
        assert_eq!(Side::from_str("SELL").unwrap(), Side::Sell);
    }
}
