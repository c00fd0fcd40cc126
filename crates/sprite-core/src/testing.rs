//! Scriptable wallet, vault SDK and API used by the flow tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chain_sol::{Keypair, SolAccountMeta, SolInstruction};
use tokio::sync::Notify;

use crate::api::{SpriteApi, TxContext};
use crate::error::SpriteError;
use crate::keystore::lock;
use crate::payment_flow::VaultInstructions;
use crate::wallet::{MessageSigner, TransactionSigner, WalletAdapter};

pub(crate) struct MockWallet {
    pub keypair: Keypair,
    pub can_sign_messages: bool,
    pub can_sign_transactions: bool,
    pub reject_with: Option<String>,
    /// When set, signing waits until notified.
    pub gate: Option<Arc<Notify>>,
    pub message_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
    connected: AtomicBool,
}

impl MockWallet {
    pub fn new(seed: u8) -> Self {
        Self {
            keypair: Keypair::from_seed(&[seed; 32]),
            can_sign_messages: true,
            can_sign_transactions: true,
            reject_with: None,
            gate: None,
            message_calls: AtomicUsize::new(0),
            transaction_calls: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> String {
        self.keypair.address()
    }

    async fn wait_and_check(&self) -> Result<(), SpriteError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reject_with {
            Some(msg) => Err(SpriteError::Wallet(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    fn name(&self) -> &str {
        "Mock"
    }

    fn public_key(&self) -> Option<[u8; 32]> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.public_key())
    }

    fn message_signer(&self) -> Option<&dyn MessageSigner> {
        if self.can_sign_messages {
            Some(self)
        } else {
            None
        }
    }

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        if self.can_sign_transactions {
            Some(self)
        } else {
            None
        }
    }

    async fn connect(&self) -> Result<(), SpriteError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SpriteError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl MessageSigner for MockWallet {
    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], SpriteError> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_and_check().await?;
        Ok(self.keypair.sign_message(message))
    }
}

#[async_trait]
impl TransactionSigner for MockWallet {
    async fn sign_transaction(&self, raw_tx: &[u8]) -> Result<Vec<u8>, SpriteError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_and_check().await?;
        Ok(chain_sol::sign_raw_transaction(&self.keypair, raw_tx)?)
    }
}

pub(crate) const PROGRAM: [u8; 32] = [0x70; 32];
/// What [`FakeVault::derive_vault`] returns for every seed.
pub(crate) const CREATED_VAULT: [u8; 32] = [0x5a; 32];

/// Vault SDK stand-in. Every instruction has the caller as its first signer.
#[derive(Default)]
pub(crate) struct FakeVault {
    pub calls: AtomicUsize,
    pub seeds: Mutex<Vec<[u8; 32]>>,
    pub edits: Mutex<Vec<[[u8; 32]; 3]>>,
}

impl FakeVault {
    fn instruction(&self, user: &[u8; 32], vault: &[u8; 32], tag: u8) -> SolInstruction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SolInstruction {
            program_id: PROGRAM,
            accounts: vec![
                SolAccountMeta { pubkey: *user, is_signer: true, is_writable: true },
                SolAccountMeta { pubkey: *vault, is_signer: false, is_writable: true },
            ],
            data: vec![tag],
        }
    }
}

#[async_trait]
impl VaultInstructions for FakeVault {
    async fn deposit(
        &self,
        vault: &[u8; 32],
        user: &[u8; 32],
        _payment_id: &str,
    ) -> Result<SolInstruction, SpriteError> {
        Ok(self.instruction(user, vault, 0xd0))
    }

    async fn withdraw(
        &self,
        vault: &[u8; 32],
        user: &[u8; 32],
        _payment_id: &str,
        _signature: &str,
    ) -> Result<SolInstruction, SpriteError> {
        Ok(self.instruction(user, vault, 0x3d))
    }

    async fn create(&self, seed: &[u8; 32], owner: &[u8; 32]) -> Result<SolInstruction, SpriteError> {
        lock(&self.seeds).push(*seed);
        let vault = self.derive_vault(seed)?;
        Ok(self.instruction(owner, &vault, 0xc0))
    }

    async fn edit(
        &self,
        vault: &[u8; 32],
        owner: &[u8; 32],
        new_owner: &[u8; 32],
        new_withdraw_authority: &[u8; 32],
    ) -> Result<SolInstruction, SpriteError> {
        lock(&self.edits).push([*vault, *new_owner, *new_withdraw_authority]);
        Ok(self.instruction(owner, vault, 0xed))
    }

    fn derive_vault(&self, _seed: &[u8; 32]) -> Result<[u8; 32], SpriteError> {
        Ok(CREATED_VAULT)
    }
}

/// API stand-in. Every send returns signature `5sig`; contexts carry
/// last valid block height 1000.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub fail_send: Option<String>,
    pub contexts: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub confirms: AtomicUsize,
}

impl FakeApi {
    pub fn calls(&self) -> usize {
        lock(&self.contexts).len() + lock(&self.sent).len() + self.confirms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpriteApi for FakeApi {
    async fn get_context(&self, ins_name: &str) -> Result<TxContext, SpriteError> {
        lock(&self.contexts).push(ins_name.to_owned());
        Ok(TxContext {
            blockhash: chain_sol::bytes_to_address(&[9u8; 32]),
            last_valid_block_height: 1_000,
            reasonable_priority_fee: 25_000,
        })
    }

    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, SpriteError> {
        if let Some(msg) = &self.fail_send {
            return Err(SpriteError::Api(msg.clone()));
        }
        lock(&self.sent).push(signed_tx.to_vec());
        Ok("5sig".into())
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        last_valid_block_height: u64,
    ) -> Result<(), SpriteError> {
        assert_eq!(signature, "5sig");
        assert_eq!(last_valid_block_height, 1_000);
        self.confirms.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
