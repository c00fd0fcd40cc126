//! Wallet capabilities and the per-page wallet context.
//!
//! Adapters expose signing as optional capabilities. Callers must branch on
//! `message_signer()` / `transaction_signer()` before signing anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::SpriteError;
use crate::keystore::lock;

#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Sign raw message bytes. May wait indefinitely on user approval.
    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], SpriteError>;
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign a wire-format transaction and return it with our slot filled.
    async fn sign_transaction(&self, raw_tx: &[u8]) -> Result<Vec<u8>, SpriteError>;
}

#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Connected public key, `None` while disconnected.
    fn public_key(&self) -> Option<[u8; 32]>;

    fn message_signer(&self) -> Option<&dyn MessageSigner>;

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner>;

    async fn connect(&self) -> Result<(), SpriteError>;

    async fn disconnect(&self) -> Result<(), SpriteError>;
}

/// Wallet state for one page instance: the offered adapters, the selected
/// one, and whether the wallet picker is open.
pub struct WalletContext {
    wallets: Vec<Arc<dyn WalletAdapter>>,
    selected: Mutex<Option<Arc<dyn WalletAdapter>>>,
    modal_open: AtomicBool,
}

impl WalletContext {
    pub fn new(wallets: Vec<Arc<dyn WalletAdapter>>) -> Self {
        Self {
            wallets,
            selected: Mutex::new(None),
            modal_open: AtomicBool::new(false),
        }
    }

    pub fn wallets(&self) -> &[Arc<dyn WalletAdapter>] {
        &self.wallets
    }

    /// Wallets shown in the picker. `hidden` is left out unless requested.
    pub fn display_wallets(&self, hidden: &str, include_hidden: bool) -> Vec<Arc<dyn WalletAdapter>> {
        self.wallets
            .iter()
            .filter(|w| include_hidden || w.name() != hidden)
            .cloned()
            .collect()
    }

    pub fn open_modal(&self) {
        self.modal_open.store(true, Ordering::SeqCst);
    }

    pub fn close_modal(&self) {
        self.modal_open.store(false, Ordering::SeqCst);
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open.load(Ordering::SeqCst)
    }

    /// Select the adapter called `name` and connect it. The picker closes
    /// once a wallet is connected.
    pub async fn connect(&self, name: &str) -> Result<(), SpriteError> {
        let wallet = self
            .wallets
            .iter()
            .find(|w| w.name() == name)
            .cloned()
            .ok_or_else(|| SpriteError::Wallet(format!("unknown wallet: {name}")))?;

        *lock(&self.selected) = Some(wallet.clone());
        wallet.connect().await?;
        tracing::info!(wallet = name, "wallet connected");
        self.close_modal();
        Ok(())
    }

    /// Best-effort reconnect of the selected adapter on page mount.
    pub async fn restore(&self) {
        let Some(wallet) = lock(&self.selected).clone() else {
            return;
        };
        if wallet.public_key().is_some() {
            return;
        }
        if let Err(e) = wallet.connect().await {
            tracing::debug!(wallet = wallet.name(), error = %e, "reconnect skipped");
        }
    }

    pub async fn disconnect(&self) -> Result<(), SpriteError> {
        let wallet = lock(&self.selected).take();
        if let Some(wallet) = wallet {
            wallet.disconnect().await?;
            tracing::info!(wallet = wallet.name(), "wallet disconnected");
        }
        Ok(())
    }

    /// The selected adapter, if it is connected.
    pub fn connected(&self) -> Option<Arc<dyn WalletAdapter>> {
        lock(&self.selected)
            .as_ref()
            .filter(|w| w.public_key().is_some())
            .cloned()
    }

    /// Base58 address of the connected wallet.
    pub fn public_key(&self) -> Option<String> {
        self.connected()
            .and_then(|w| w.public_key())
            .map(|k| chain_sol::bytes_to_address(&k))
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("wallets", &self.wallets.iter().map(|w| w.name().to_owned()).collect::<Vec<_>>())
            .field("connected", &self.public_key())
            .field("modal_open", &self.is_modal_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;

    fn ctx() -> (WalletContext, Arc<MockWallet>) {
        let wallet = Arc::new(MockWallet::new(7));
        let ctx = WalletContext::new(vec![wallet.clone() as Arc<dyn WalletAdapter>]);
        (ctx, wallet)
    }

    #[tokio::test]
    async fn connect_closes_picker() {
        let (ctx, wallet) = ctx();
        ctx.open_modal();
        ctx.connect("Mock").await.unwrap();
        assert!(!ctx.is_modal_open());
        assert_eq!(ctx.public_key(), Some(wallet.address()));
    }

    #[tokio::test]
    async fn unknown_wallet_is_an_error() {
        let (ctx, _) = ctx();
        ctx.open_modal();
        let err = ctx.connect("Phantom").await.unwrap_err();
        assert_eq!(err.to_string(), "unknown wallet: Phantom");
        assert!(ctx.is_modal_open());
        assert!(ctx.connected().is_none());
    }

    #[tokio::test]
    async fn disconnect_clears_selection() {
        let (ctx, wallet) = ctx();
        ctx.connect("Mock").await.unwrap();
        ctx.disconnect().await.unwrap();
        assert!(ctx.public_key().is_none());
        assert!(wallet.public_key().is_none());

        // Nothing selected any more, so restore has nothing to do.
        ctx.restore().await;
        assert!(wallet.public_key().is_none());
    }

    #[tokio::test]
    async fn restore_reconnects_selected_wallet() {
        let (ctx, wallet) = ctx();
        ctx.connect("Mock").await.unwrap();
        wallet.disconnect().await.unwrap();
        assert!(ctx.connected().is_none());
        ctx.restore().await;
        assert!(ctx.connected().is_some());
    }

    #[test]
    fn hidden_wallet_is_filtered() {
        let (ctx, _) = ctx();
        assert!(ctx.display_wallets("Mock", false).is_empty());
        assert_eq!(ctx.display_wallets("Mock", true).len(), 1);
        assert_eq!(ctx.display_wallets("Keypair Wallet", false).len(), 1);
    }
}
