//! Deposit and withdrawal pages.
//!
//! `Idle -> Retrieving -> Signing -> Sending -> Confirming`, then a redirect
//! to `/{kind}-complete` carrying either the transaction signature or the
//! error message.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chain_sol::{build_priority_transaction, serialize_unsigned, SolInstruction};
use url::form_urlencoded;

use crate::amount::{extract_amount, PaymentAmount};
use crate::api::SpriteApi;
use crate::error::SpriteError;
use crate::keystore::lock;
use crate::request::query_param;
use crate::types::PaymentKind;
use crate::wallet::{WalletAdapter, WalletContext};

/// Vault program instructions, supplied by the vault SDK.
#[async_trait]
pub trait VaultInstructions: Send + Sync {
    async fn deposit(
        &self,
        vault: &[u8; 32],
        user: &[u8; 32],
        payment_id: &str,
    ) -> Result<SolInstruction, SpriteError>;

    /// `signature` authorizes the withdrawal and is issued by the bot.
    async fn withdraw(
        &self,
        vault: &[u8; 32],
        user: &[u8; 32],
        payment_id: &str,
        signature: &str,
    ) -> Result<SolInstruction, SpriteError>;

    /// Create a vault owned by `owner` from a fresh 32-byte seed.
    async fn create(
        &self,
        seed: &[u8; 32],
        owner: &[u8; 32],
    ) -> Result<SolInstruction, SpriteError>;

    /// Hand a vault over to a new owner and withdraw authority. `owner` must
    /// be the current owner.
    async fn edit(
        &self,
        vault: &[u8; 32],
        owner: &[u8; 32],
        new_owner: &[u8; 32],
        new_withdraw_authority: &[u8; 32],
    ) -> Result<SolInstruction, SpriteError>;

    /// Address of the vault that `create(seed, ..)` makes.
    fn derive_vault(&self, seed: &[u8; 32]) -> Result<[u8; 32], SpriteError>;
}

/// Parameters of a deposit or withdrawal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub kind: PaymentKind,
    pub name: String,
    pub user_id: String,
    pub payment_id: String,
    /// Withdrawals only.
    pub signature: Option<String>,
}

impl PaymentRequest {
    pub fn from_query(kind: PaymentKind, query: &str) -> Self {
        let signature = match kind {
            PaymentKind::Deposit => None,
            PaymentKind::Withdraw => Some(query_param(query, "signature")).filter(|s| !s.is_empty()),
        };
        Self {
            kind,
            name: query_param(query, "name"),
            user_id: query_param(query, "user_id"),
            payment_id: query_param(query, kind.id_field()),
            signature,
        }
    }

    pub fn amount(&self) -> PaymentAmount {
        extract_amount(&self.payment_id)
    }

    /// `Ok(signature)` or `Err(message)`.
    fn complete_url(&self, outcome: Result<&str, &str>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match outcome {
            Ok(signature) => query
                .append_pair("status", "success")
                .append_pair("signature", signature),
            Err(message) => query.append_pair("status", "error").append_pair("error", message),
        };
        let query = query
            .append_pair(self.kind.id_field(), &self.payment_id)
            .append_pair("user_id", &self.user_id)
            .append_pair("name", &self.name)
            .finish();
        format!("/{}-complete?{query}", self.kind.route())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    Idle,
    Retrieving,
    Signing,
    Sending,
    Confirming,
    /// Terminal: holds the complete-page URL.
    Done(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// No wallet connected; the wallet picker was opened.
    ConnectRequested,
    /// A submission is already running.
    Busy,
    /// Redirect to the complete page, success or not.
    Redirected(String),
}

pub struct PaymentFlow {
    request: PaymentRequest,
    vault: [u8; 32],
    api: Arc<dyn SpriteApi>,
    instructions: Arc<dyn VaultInstructions>,
    state: Mutex<PaymentState>,
}

impl PaymentFlow {
    pub fn new(
        request: PaymentRequest,
        vault: [u8; 32],
        api: Arc<dyn SpriteApi>,
        instructions: Arc<dyn VaultInstructions>,
    ) -> Self {
        Self {
            request,
            vault,
            api,
            instructions,
            state: Mutex::new(PaymentState::Idle),
        }
    }

    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn state(&self) -> PaymentState {
        lock(&self.state).clone()
    }

    fn set_state(&self, state: PaymentState) {
        *lock(&self.state) = state;
    }

    pub fn button_label(&self, ctx: &WalletContext) -> &'static str {
        match self.state() {
            PaymentState::Idle if ctx.public_key().is_none() => "Connect Wallet",
            PaymentState::Idle => self.request.kind.submit_label(),
            PaymentState::Retrieving => "Retrieving...",
            PaymentState::Signing => "Signing...",
            PaymentState::Sending => "Sending...",
            PaymentState::Confirming => "Confirming...",
            PaymentState::Done(_) => "Redirecting...",
        }
    }

    pub fn button_disabled(&self) -> bool {
        self.state() != PaymentState::Idle
    }

    /// Build, sign, send and confirm the payment transaction.
    pub async fn submit(&self, ctx: &WalletContext) -> PaymentOutcome {
        let wallet = {
            let mut state = lock(&self.state);
            match &*state {
                PaymentState::Idle => {}
                PaymentState::Done(url) => return PaymentOutcome::Redirected(url.clone()),
                _ => return PaymentOutcome::Busy,
            }
            let Some(wallet) = ctx.connected() else {
                ctx.open_modal();
                return PaymentOutcome::ConnectRequested;
            };
            *state = PaymentState::Retrieving;
            wallet
        };

        let url = match self.run(wallet.as_ref()).await {
            Ok(signature) => {
                tracing::info!(
                    kind = self.request.kind.route(),
                    payment_id = %self.request.payment_id,
                    %signature,
                    "payment confirmed"
                );
                self.request.complete_url(Ok(&signature))
            }
            Err(e) => {
                tracing::warn!(
                    kind = self.request.kind.route(),
                    payment_id = %self.request.payment_id,
                    error = %e,
                    "payment failed"
                );
                self.request.complete_url(Err(&e.to_string()))
            }
        };
        self.set_state(PaymentState::Done(url.clone()));
        PaymentOutcome::Redirected(url)
    }

    async fn run(&self, wallet: &dyn WalletAdapter) -> Result<String, SpriteError> {
        let user = wallet.public_key().ok_or(SpriteError::WalletNotConnected)?;
        let req = &self.request;

        let instruction = match req.kind {
            PaymentKind::Deposit => {
                self.instructions
                    .deposit(&self.vault, &user, &req.payment_id)
                    .await?
            }
            PaymentKind::Withdraw => {
                let signature = req.signature.as_deref().ok_or_else(|| {
                    SpriteError::InvalidPayment("signature required for withdrawal".into())
                })?;
                self.instructions
                    .withdraw(&self.vault, &user, &req.payment_id, signature)
                    .await?
            }
        };

        send_priority_transaction(
            self.api.as_ref(),
            wallet,
            &user,
            instruction,
            req.kind.route(),
            &|step| {
                self.set_state(match step {
                    TxStep::Signing => PaymentState::Signing,
                    TxStep::Sending => PaymentState::Sending,
                    TxStep::Confirming => PaymentState::Confirming,
                })
            },
        )
        .await
    }
}

/// Wallet-facing stages of [`send_priority_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxStep {
    Signing,
    Sending,
    Confirming,
}

/// Wrap `instruction` in a priority-fee transaction paid by `fee_payer`,
/// have the wallet sign it, then send and confirm it. Returns the
/// transaction signature.
pub(crate) async fn send_priority_transaction(
    api: &dyn SpriteApi,
    wallet: &dyn WalletAdapter,
    fee_payer: &[u8; 32],
    instruction: SolInstruction,
    ins_name: &str,
    on_step: &(dyn Fn(TxStep) + Send + Sync),
) -> Result<String, SpriteError> {
    let ctx = api.get_context(ins_name).await?;
    let blockhash = chain_sol::address_to_bytes(&ctx.blockhash)
        .map_err(|e| SpriteError::Api(format!("invalid blockhash: {e}")))?;
    let tx = build_priority_transaction(
        instruction,
        fee_payer,
        &blockhash,
        ctx.reasonable_priority_fee,
    )?;
    let unsigned = serialize_unsigned(&tx)?;

    on_step(TxStep::Signing);
    let signer = wallet
        .transaction_signer()
        .ok_or(SpriteError::TransactionSigningUnsupported)?;
    let signed = signer.sign_transaction(&unsigned).await?;

    on_step(TxStep::Sending);
    let signature = api.send_transaction(&signed).await?;

    on_step(TxStep::Confirming);
    api.confirm_transaction(&signature, ctx.last_valid_block_height)
        .await?;
    Ok(signature)
}

/// The `/{kind}-complete` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCompletion {
    pub kind: PaymentKind,
    pub success: bool,
    pub signature: String,
    pub payment_id: String,
    pub name: String,
    pub user_id: String,
    pub error: String,
}

impl PaymentCompletion {
    /// A missing `status` reads as failure.
    pub fn from_query(kind: PaymentKind, query: &str) -> Self {
        Self {
            kind,
            success: query_param(query, "status") == "success",
            signature: query_param(query, "signature"),
            payment_id: query_param(query, kind.id_field()),
            name: query_param(query, "name"),
            user_id: query_param(query, "user_id"),
            error: query_param(query, "error"),
        }
    }

    pub fn amount(&self) -> PaymentAmount {
        extract_amount(&self.payment_id)
    }

    /// Error to display; falls back to a generic message.
    pub fn error_message(&self) -> String {
        if !self.error.is_empty() {
            return self.error.clone();
        }
        format!(
            "Unknown error occurred during {} processing",
            match self.kind {
                PaymentKind::Deposit => "deposit",
                PaymentKind::Withdraw => "withdrawal",
            }
        )
    }

    pub fn explorer_url(&self) -> Option<String> {
        if self.signature.is_empty() {
            return None;
        }
        let encoded: String = form_urlencoded::byte_serialize(self.signature.as_bytes()).collect();
        Some(format!("https://solscan.io/tx/{encoded}"))
    }
}
