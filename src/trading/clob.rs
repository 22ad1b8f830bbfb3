//! Authenticated CLOB session backed by the Polymarket SDK.
//!
//! Public reads (books, market metadata, the listing) go over plain HTTP.
//! Everything that touches the wallet's orders or balances goes through a
//! [`ClobSession`], which carries the SDK client's API-key credentials and
//! the local signer used for order signatures.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Credentials, Normal};
use polymarket_client_sdk::clob::types::{OrderType as ClobOrderType, Side as ClobSide};
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::{Address, U256};
use tracing::info;

use super::order::{OrderAck, OrderType, Side};
use crate::config::Config;
use crate::error::TradingError;
use crate::signing;

/// SDK client after L1 key derivation or with configured L2 credentials.
pub(crate) type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Cursor value the CLOB returns on the last page.
pub const END_CURSOR: &str = "LTE=";

/// Authenticated CLOB client plus the signer its orders are signed with.
#[derive(Clone)]
pub struct ClobSession {
    client: Arc<AuthenticatedClient>,
    signer: Arc<PrivateKeySigner>,
}

impl ClobSession {
    /// Authenticate against the CLOB.
    ///
    /// Configured API credentials are used as-is; without them the SDK
    /// creates or derives a key from the wallet signature. A configured
    /// funder switches the session to the configured proxy signature type.
    pub async fn connect(config: &Config) -> Result<Self, TradingError> {
        let signer = signing::create_signer(&config.polymarket_private_key)?
            .with_chain_id(Some(config.chain_id));
        let credentials = configured_credentials(config)?;
        let funder = funder_address(config)?;

        let mut builder = Client::new(&config.polymarket_clob_url, ClobConfig::default())
            .map_err(|e| {
                TradingError::AuthenticationFailed(format!("failed to create CLOB client: {}", e))
            })?
            .authentication_builder(&signer);

        let using_configured_key = credentials.is_some();
        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }
        if let Some(funder) = funder {
            builder = builder
                .funder(funder)
                .signature_type(signing::signature_type_from_u8(config.polymarket_signature_type));
        }

        let client = builder
            .authenticate()
            .await
            .map_err(|e| TradingError::AuthenticationFailed(e.to_string()))?;

        info!(
            address = %signer.address(),
            chain_id = config.chain_id,
            configured_key = using_configured_key,
            "CLOB session authenticated"
        );

        Ok(Self {
            client: Arc::new(client),
            signer: Arc::new(signer),
        })
    }

    pub(crate) fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for ClobSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClobSession")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

/// API credentials from POLYMARKET_API_KEY / _SECRET / _PASSPHRASE.
///
/// All three or none; blank values count as unset.
pub fn configured_credentials(config: &Config) -> Result<Option<Credentials>, TradingError> {
    let present = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match (
        present(&config.polymarket_api_key),
        present(&config.polymarket_api_secret),
        present(&config.polymarket_api_passphrase),
    ) {
        (None, None, None) => Ok(None),
        (Some(key), Some(secret), Some(passphrase)) => serde_json::from_value(serde_json::json!({
            "apiKey": key,
            "secret": secret,
            "passphrase": passphrase,
        }))
        .map(Some)
        .map_err(|e| TradingError::AuthenticationFailed(format!("invalid API credentials: {}", e))),
        _ => Err(TradingError::AuthenticationFailed(
            "POLYMARKET_API_KEY, POLYMARKET_API_SECRET and POLYMARKET_API_PASSPHRASE must be set together"
                .to_string(),
        )),
    }
}

/// Proxy wallet that holds the funds, when one is configured.
pub fn funder_address(config: &Config) -> Result<Option<Address>, TradingError> {
    config
        .polymarket_funder
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Address::from_str(s).map_err(|e| {
                TradingError::AuthenticationFailed(format!("invalid POLYMARKET_FUNDER '{}': {}", s, e))
            })
        })
        .transpose()
}

/// CLOB token ids are 256-bit decimal integers.
pub fn token_id_from_str(token_id: &str) -> Result<U256, TradingError> {
    U256::from_str(token_id)
        .map_err(|e| TradingError::InvalidParams(format!("invalid token id '{}': {}", token_id, e)))
}

pub(crate) fn clob_side(side: Side) -> ClobSide {
    match side {
        Side::Buy => ClobSide::Buy,
        Side::Sell => ClobSide::Sell,
    }
}

pub(crate) fn clob_order_type(order_type: OrderType) -> ClobOrderType {
    match order_type {
        OrderType::GTC => ClobOrderType::GTC,
        OrderType::FOK => ClobOrderType::FOK,
    }
}

/// Fold a post-order response into an [`OrderAck`]; empty strings mean absent.
pub(crate) fn order_ack(
    success: bool,
    order_id: impl Into<Option<String>>,
    error_msg: impl Into<Option<String>>,
) -> OrderAck {
    OrderAck {
        success,
        order_id: order_id.into().filter(|id| !id.is_empty()),
        error_msg: error_msg.into().filter(|msg| !msg.is_empty()),
    }
}

/// Cursor for the next page, or `None` on the last one.
pub(crate) fn next_cursor(cursor: impl Into<Option<String>>) -> Option<String> {
    cursor
        .into()
        .filter(|next| !next.is_empty() && next != END_CURSOR)
}
