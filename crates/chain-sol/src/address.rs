//! Solana addresses.
//!
//! An address is the Base58 encoding of a raw 32-byte Ed25519 public key.
//! Anything that does not decode to exactly 32 bytes is not an address.

use crate::error::SolError;

/// Encode a 32-byte public key as its Base58 address.
pub fn keypair_to_address(ed25519_pubkey: &[u8; 32]) -> String {
    bs58::encode(ed25519_pubkey).into_string()
}

/// Validate an address string.
///
/// Returns `Ok(true)` when the string decodes to exactly 32 bytes, or an
/// `InvalidAddress` error describing why it does not.
pub fn validate_address(address: &str) -> Result<bool, SolError> {
    address_to_bytes(address).map(|_| true)
}

/// Decode an address string to its 32 raw bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    if address.is_empty() {
        return Err(SolError::InvalidAddress("empty address".into()));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Encode 32 bytes as an address string.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    keypair_to_address(bytes)
}
