//! Wallet keys and signature types.
//!
//! Signers are cached per private key so repeated address lookups do not
//! re-derive the key.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use alloy::signers::local::PrivateKeySigner;
use once_cell::sync::Lazy;
use polymarket_client_sdk::clob::types::SignatureType;
use tracing::debug;

use crate::error::TradingError;

/// Signers keyed by a hash of the private key, never the key itself.
static SIGNER_CACHE: Lazy<RwLock<HashMap<u64, PrivateKeySigner>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn key_hash(private_key: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    private_key.hash(&mut hasher);
    hasher.finish()
}

/// Map the configured signature type to the SDK's enum.
///
/// 0 = EOA, 1 = Magic.link proxy, 2 = Gnosis Safe; anything else is treated as EOA.
pub fn signature_type_from_u8(sig_type: u8) -> SignatureType {
    match sig_type {
        1 => SignatureType::Proxy,
        2 => SignatureType::GnosisSafe,
        _ => SignatureType::Eoa,
    }
}

/// Human-readable label for a configured signature type.
pub fn signature_type_label(sig_type: u8) -> &'static str {
    match signature_type_from_u8(sig_type) {
        SignatureType::Proxy => "Magic.link - Proxy wallet",
        SignatureType::GnosisSafe => "Gnosis Safe - Multi-sig",
        _ => "EOA - Standard wallet",
    }
}

/// Create a signer from a hex private key, with or without the 0x prefix.
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(key)
        .map_err(|e| TradingError::SigningError(format!("Invalid private key hex: {}", e)))?;

    let key_bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        TradingError::SigningError(format!("Private key must be 32 bytes, got {}", bytes.len()))
    })?;

    PrivateKeySigner::from_bytes(&key_bytes.into())
        .map_err(|e| TradingError::SigningError(format!("Failed to create signer: {}", e)))
}

fn cached_signer(private_key: &str) -> Result<PrivateKeySigner, TradingError> {
    let hash = key_hash(private_key);

    if let Some(signer) = SIGNER_CACHE
        .read()
        .map_err(|e| TradingError::SigningError(format!("signer cache poisoned: {}", e)))?
        .get(&hash)
    {
        return Ok(signer.clone());
    }

    let signer = create_signer(private_key)?;
    SIGNER_CACHE
        .write()
        .map_err(|e| TradingError::SigningError(format!("signer cache poisoned: {}", e)))?
        .entry(hash)
        .or_insert_with(|| signer.clone());
    debug!("Cached new signer");

    Ok(signer)
}

/// Get the checksummed wallet address for a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, TradingError> {
    let signer = cached_signer(private_key)?;
    Ok(format!("{:?}", signer.address()))
}
