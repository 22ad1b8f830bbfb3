//! Polymarket API client wrapper.

use std::time::{Duration, Instant};

use polymarket_client_sdk::clob::types::request::BalanceAllowanceRequest;
use polymarket_client_sdk::clob::types::AssetType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::TradingError;
use crate::metrics;
use crate::orderbook::{OrderBook, PriceLevel};
use crate::signing;
use crate::trading::clob::{token_id_from_str, ClobSession};

/// Conditional tokens and USDC both use 6 decimals on chain.
const TOKEN_DECIMALS: u32 = 6;

/// Polymarket CLOB and Gamma API client.
///
/// [`PolymarketClient::new`] gives a public client for books, market
/// metadata and search. [`PolymarketClient::connect`] also authenticates a
/// [`ClobSession`] for balances and order management.
#[derive(Debug, Clone)]
pub struct PolymarketClient {
    /// HTTP client for public API requests.
    http: reqwest::Client,
    /// Base URL for CLOB API.
    clob_url: String,
    /// Base URL for Gamma API.
    gamma_url: String,
    /// Wallet private key (may be empty for a public client).
    private_key: String,
    /// Chain ID (137 for Polygon).
    chain_id: u64,
    /// Authenticated session, present after `connect`.
    clob: Option<ClobSession>,
}

/// Order book response from API.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookResponse {
    /// Bid levels.
    pub bids: Option<Vec<OrderLevel>>,
    /// Ask levels.
    pub asks: Option<Vec<OrderLevel>>,
    /// Market ID.
    pub market: Option<String>,
    /// Asset ID.
    pub asset_id: Option<String>,
}

/// Single price level in order book.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderLevel {
    /// Price at this level.
    pub price: String,
    /// Size available at this level.
    pub size: String,
}

impl PolymarketClient {
    /// Create a public client. No private key is needed.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(config.http_pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            clob_url: config.polymarket_clob_url.trim_end_matches('/').to_string(),
            gamma_url: config.gamma_api_url.trim_end_matches('/').to_string(),
            private_key: config.polymarket_private_key.clone(),
            chain_id: config.chain_id,
            clob: None,
        })
    }

    /// Create a client and authenticate its CLOB session.
    pub async fn connect(config: &Config) -> Result<Self, TradingError> {
        let mut client = Self::new(config).map_err(|e| TradingError::gateway("connect", e))?;
        client.clob = Some(ClobSession::connect(config).await?);
        Ok(client)
    }

    /// The authenticated session, or an error for a public client.
    pub fn session(&self) -> Result<&ClobSession, TradingError> {
        self.clob.as_ref().ok_or_else(|| {
            TradingError::AuthenticationFailed(
                "no CLOB session; create the client with PolymarketClient::connect".to_string(),
            )
        })
    }

    /// Whether this client can trade.
    pub fn is_authenticated(&self) -> bool {
        self.clob.is_some()
    }

    /// Get the HTTP client reference.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get order book for a token.
    #[instrument(skip(self), fields(token_id = %token_id))]
    pub async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, TradingError> {
        let started = Instant::now();
        let url = format!("{}/book", self.clob_url);

        let response = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await
            .map_err(|e| TradingError::gateway("order_book", e))?;

        if !response.status().is_success() {
            return Err(TradingError::gateway(
                "order_book",
                format!("HTTP {}", response.status()),
            ));
        }

        let book: OrderBookResponse = response
            .json()
            .await
            .map_err(|e| TradingError::gateway("order_book", format!("parse: {}", e)))?;

        metrics::record_http_latency(started, "book");
        Ok(convert_order_book(token_id, book))
    }

    /// Get the held balance of a conditional token, in shares.
    #[instrument(skip(self), fields(token_id = %token_id))]
    pub async fn get_token_balance(&self, token_id: &str) -> Result<Decimal, TradingError> {
        let session = self.session()?;
        let started = Instant::now();

        let request = BalanceAllowanceRequest::builder()
            .asset_type(AssetType::Conditional)
            .token_id(token_id_from_str(token_id)?)
            .build();
        let response = session
            .client()
            .balance_allowance(request)
            .await
            .map_err(|e| TradingError::gateway("balance", e))?;
        let balance = from_base_units(response.balance);

        metrics::record_http_latency(started, "balance-allowance");
        debug!(balance = %balance, "Retrieved token balance");

        Ok(balance)
    }

    /// Get the wallet address derived from the private key.
    pub fn get_address(&self) -> Result<String, TradingError> {
        signing::address_from_private_key(&self.private_key)
    }

    /// Get the CLOB base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// Get the Gamma base URL.
    pub fn gamma_url(&self) -> &str {
        &self.gamma_url
    }

    /// Get the chain ID.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Convert an API book into an [`OrderBook`], dropping empty or malformed levels.
fn convert_order_book(token_id: &str, response: OrderBookResponse) -> OrderBook {
    let parse_levels = |levels: Option<Vec<OrderLevel>>| -> Vec<PriceLevel> {
        levels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|level| {
                let price: Decimal = level.price.parse().ok()?;
                let size: Decimal = level.size.parse().ok()?;
                if size > Decimal::ZERO {
                    Some(PriceLevel { price, size })
                } else {
                    None
                }
            })
            .collect()
    };

    OrderBook::new(token_id, parse_levels(response.bids), parse_levels(response.asks))
}

fn from_base_units(raw: Decimal) -> Decimal {
    (raw / Decimal::from(10u64.pow(TOKEN_DECIMALS))).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use rust_decimal_macros::dec;

    #[test]
    fn client_creation_works() {
        let client = PolymarketClient::new(&test_config()).unwrap();
        assert_eq!(client.chain_id(), 137);
        assert_eq!(client.clob_url(), "https://clob.polymarket.com");
        assert_eq!(client.gamma_url(), "https://gamma-api.polymarket.com");
    }

    #[test]
    fn public_client_needs_no_private_key() {
        let config = Config {
            polymarket_private_key: String::new(),
            ..test_config()
        };
        let client = PolymarketClient::new(&config).unwrap();
        assert!(!client.is_authenticated());
        assert!(matches!(
            client.session(),
            Err(TradingError::AuthenticationFailed(_))
        ));
        assert!(client.get_address().is_err());
    }

    #[tokio::test]
    async fn balance_needs_an_authenticated_session() {
        let client = PolymarketClient::new(&test_config()).unwrap();
        let result = client.get_token_balance("12345").await;
        assert!(matches!(result, Err(TradingError::AuthenticationFailed(_))));
    }

    #[test]
    fn get_address_works() {
        let client = PolymarketClient::new(&test_config()).unwrap();
        let addr = client.get_address().unwrap();
        assert!(addr.starts_with("0x"));
        assert_eq!(addr.len(), 42); // 0x + 40 hex chars
    }

    #[test]
    fn convert_order_book_sorts_and_filters() {
        let response: OrderBookResponse = serde_json::from_value(serde_json::json!({
            "bids": [
                {"price": "0.40", "size": "10"},
                {"price": "0.45", "size": "5"},
                {"price": "0.46", "size": "0"}
            ],
            "asks": [
                {"price": "0.55", "size": "10"},
                {"price": "0.50", "size": "abc"},
                {"price": "0.52", "size": "3"}
            ]
        }))
        .unwrap();

        let book = convert_order_book("tok", response);
        assert_eq!(book.best_bid(), Some(dec!(0.45)));
        assert_eq!(book.best_ask(), Some(dec!(0.52)));
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 2);
    }

    #[test]
    fn missing_sides_give_empty_levels() {
        let response: OrderBookResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let book = convert_order_book("tok", response);
        assert!(!book.is_two_sided());
    }

    #[test]
    fn balance_is_scaled_from_base_units() {
        assert_eq!(from_base_units(dec!(30000000)), dec!(30));
        assert_eq!(from_base_units(dec!(1500000)), dec!(1.5));
        assert_eq!(from_base_units(dec!(0)), dec!(0));
    }
}
