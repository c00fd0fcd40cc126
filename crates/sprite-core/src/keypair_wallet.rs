//! A wallet backed by a raw keypair kept in a [`KeyStore`].
//!
//! Meant for power users and automation: the secret key is imported as a
//! JSON byte array and persisted until the wallet is disconnected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chain_sol::keypair::json_byte;
use chain_sol::Keypair;
use zeroize::Zeroize;

use crate::error::SpriteError;
use crate::keystore::{lock, KeyStore};
use crate::wallet::{MessageSigner, TransactionSigner, WalletAdapter};

pub const KEYPAIR_WALLET_NAME: &str = "Keypair Wallet";

/// Storage slot of the persisted secret key.
pub const KEYPAIR_STORAGE_KEY: &str = "ivy:keypair-wallet-adapter";

pub struct KeypairWalletAdapter {
    store: Arc<dyn KeyStore>,
    keypair: Mutex<Option<Arc<Keypair>>>,
    connected: AtomicBool,
}

impl KeypairWalletAdapter {
    /// Create the adapter, restoring a previously stored keypair. Unreadable
    /// entries are dropped from the store.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        let keypair = match store.load(KEYPAIR_STORAGE_KEY) {
            Ok(Some(mut json)) => {
                let parsed = Keypair::from_json(&json);
                json.zeroize();
                match parsed {
                    Ok(kp) => Some(Arc::new(kp)),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to load stored keypair");
                        if let Err(e) = store.remove(KEYPAIR_STORAGE_KEY) {
                            tracing::warn!(error = %e, "failed to clear stored keypair");
                        }
                        None
                    }
                }
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "keypair store unavailable");
                None
            }
        };

        Self {
            store,
            keypair: Mutex::new(keypair),
            connected: AtomicBool::new(false),
        }
    }

    /// Use `keypair` from now on and persist it.
    pub fn set_keypair(&self, keypair: Keypair) -> Result<(), SpriteError> {
        let mut json = keypair.to_json()?;
        *lock(&self.keypair) = Some(Arc::new(keypair));
        let result = self.store.store(KEYPAIR_STORAGE_KEY, &json);
        json.zeroize();
        result
    }

    /// Import a secret key pasted as a JSON byte array.
    pub fn import_json(&self, text: &str) -> Result<(), SpriteError> {
        let keypair = Keypair::from_json(text).map_err(|e| {
            tracing::warn!(error = %e, "invalid keypair secret");
            SpriteError::InvalidKeypair(
                "Invalid secret key. Please ensure it's a valid JSON-encoded secret key.".into(),
            )
        })?;
        self.set_keypair(keypair)
    }

    pub fn has_keypair(&self) -> bool {
        lock(&self.keypair).is_some()
    }

    fn active_keypair(&self) -> Result<Arc<Keypair>, SpriteError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SpriteError::WalletNotConnected);
        }
        lock(&self.keypair)
            .clone()
            .ok_or(SpriteError::WalletNotConnected)
    }
}

#[async_trait]
impl WalletAdapter for KeypairWalletAdapter {
    fn name(&self) -> &str {
        KEYPAIR_WALLET_NAME
    }

    fn public_key(&self) -> Option<[u8; 32]> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        lock(&self.keypair).as_ref().map(|kp| kp.public_key())
    }

    fn message_signer(&self) -> Option<&dyn MessageSigner> {
        Some(self)
    }

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        Some(self)
    }

    async fn connect(&self) -> Result<(), SpriteError> {
        if !self.has_keypair() {
            return Err(SpriteError::Wallet(
                "No keypair available. Import a secret key first.".into(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SpriteError> {
        *lock(&self.keypair) = None;
        self.connected.store(false, Ordering::SeqCst);
        self.store.remove(KEYPAIR_STORAGE_KEY)
    }
}

#[async_trait]
impl MessageSigner for KeypairWalletAdapter {
    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], SpriteError> {
        Ok(self.active_keypair()?.sign_message(message))
    }
}

#[async_trait]
impl TransactionSigner for KeypairWalletAdapter {
    async fn sign_transaction(&self, raw_tx: &[u8]) -> Result<Vec<u8>, SpriteError> {
        let keypair = self.active_keypair()?;
        Ok(chain_sol::sign_raw_transaction(&keypair, raw_tx)?)
    }
}

/// Check pasted secret-key text before attempting an import. Returns the
/// message to show, or `None` when the shape is acceptable.
pub fn validate_secret_key_input(text: &str) -> Option<&'static str> {
    if text.trim().is_empty() {
        return Some("Secret key is required.");
    }
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Some("Invalid JSON."),
    };
    let Some(items) = parsed.as_array() else {
        return Some("Secret key must be a JSON array of bytes.");
    };
    if items
        .iter()
        .all(|n| n.as_number().and_then(json_byte).is_some())
    {
        None
    } else {
        Some("Array must contain integers between 0 and 255.")
    }
}
