//! Ed25519 keypairs in Solana's 64-byte `seed || pubkey` layout.
//!
//! The JSON form is an array of 64 integers, the same shape the Solana CLI
//! writes to keypair files and browser wallets paste into import dialogs.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::address::keypair_to_address;
use crate::error::SolError;
use crate::signature::SIGNATURE_LEN;

/// Length of a serialized secret key (`seed || pubkey`).
pub const SECRET_KEY_LEN: usize = 64;

/// An Ed25519 keypair. The signing key zeroizes itself on drop.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Build a keypair from the 64-byte `seed || pubkey` secret key.
    ///
    /// The public half must match the key derived from the seed.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self, SolError> {
        let mut bytes: [u8; SECRET_KEY_LEN] = secret.try_into().map_err(|_| {
            SolError::InvalidSecretKey(format!(
                "expected {SECRET_KEY_LEN} bytes, got {}",
                secret.len()
            ))
        })?;

        let result = SigningKey::from_keypair_bytes(&bytes)
            .map_err(|_| SolError::InvalidSecretKey("public key does not match seed".into()));
        bytes.zeroize();

        Ok(Self {
            signing_key: result?,
        })
    }

    /// Parse the JSON array form of a secret key. Integral floats such as
    /// `1.0` count as bytes.
    pub fn from_json(text: &str) -> Result<Self, SolError> {
        let values: Vec<serde_json::Number> = serde_json::from_str(text)
            .map_err(|e| SolError::InvalidSecretKey(format!("invalid JSON byte array: {e}")))?;
        let mut bytes = values
            .iter()
            .map(json_byte)
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| SolError::InvalidSecretKey("array values must be integers 0-255".into()))?;
        let result = Self::from_secret_key(&bytes);
        bytes.zeroize();
        result
    }

    /// Serialize the secret key as a JSON byte array.
    pub fn to_json(&self) -> Result<String, SolError> {
        let mut bytes = self.signing_key.to_keypair_bytes();
        let json = serde_json::to_string(&bytes.as_slice())
            .map_err(|e| SolError::SerializationError(e.to_string()));
        bytes.zeroize();
        json
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 address of the public key.
    pub fn address(&self) -> String {
        keypair_to_address(&self.public_key())
    }

    /// Sign an arbitrary message.
    pub fn sign_message(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// A JSON number that is a whole value in `0..=255`.
pub fn json_byte(n: &serde_json::Number) -> Option<u8> {
    match n.as_u64() {
        Some(v) => u8::try_from(v).ok(),
        None => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (0.0..=255.0).contains(f))
            .map(|f| f as u8),
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
