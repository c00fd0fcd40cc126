//! The `/setup` page: create a vault owned by the connected wallet, or hand
//! an existing vault to a new owner and withdraw authority.
//!
//! Both actions share one busy flag; while either runs, the other is a
//! no-op.

use std::sync::{Arc, Mutex};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::api::SpriteApi;
use crate::error::SpriteError;
use crate::keystore::lock;
use crate::payment_flow::{send_priority_transaction, TxStep, VaultInstructions};
use crate::wallet::{WalletAdapter, WalletContext};

/// Instruction names passed to `get_context`.
const CREATE_INS: &str = "vault_create";
const EDIT_INS: &str = "vault_edit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Create,
    Edit,
}

/// What the page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupView {
    pub busy: Option<SetupAction>,
    pub status: Option<String>,
    pub error: Option<String>,
    /// Base58 address of the vault made by the last successful create.
    pub created_vault: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// No wallet connected; the picker was opened.
    ConnectRequested,
    /// Another action is running.
    Busy,
    Created { vault: String, signature: String },
    Edited { signature: String },
    Failed(String),
}

pub struct SetupFlow {
    api: Arc<dyn SpriteApi>,
    instructions: Arc<dyn VaultInstructions>,
    view: Mutex<SetupView>,
}

impl SetupFlow {
    pub fn new(api: Arc<dyn SpriteApi>, instructions: Arc<dyn VaultInstructions>) -> Self {
        Self {
            api,
            instructions,
            view: Mutex::new(SetupView::default()),
        }
    }

    pub fn view(&self) -> SetupView {
        lock(&self.view).clone()
    }

    fn set_status(&self, status: &str) {
        lock(&self.view).status = Some(status.to_owned());
    }

    pub fn button_label(&self, action: SetupAction) -> &'static str {
        match (self.view().busy, action) {
            (Some(busy), _) if busy == action => "Processing...",
            (_, SetupAction::Create) => "Create Vault",
            (_, SetupAction::Edit) => "Edit Vault",
        }
    }

    pub fn buttons_disabled(&self) -> bool {
        self.view().busy.is_some()
    }

    /// Check-and-advance into `action`. `check` runs under the lock after
    /// the wallet check; its error is shown without marking the page busy.
    fn start<T>(
        &self,
        ctx: &WalletContext,
        action: SetupAction,
        check: impl FnOnce() -> Result<T, SpriteError>,
    ) -> Result<(Arc<dyn WalletAdapter>, T), SetupOutcome> {
        let mut view = lock(&self.view);
        if view.busy.is_some() {
            return Err(SetupOutcome::Busy);
        }
        view.error = None;
        view.status = None;
        if action == SetupAction::Create {
            view.created_vault = None;
        }
        let Some(wallet) = ctx.connected() else {
            ctx.open_modal();
            return Err(SetupOutcome::ConnectRequested);
        };
        let checked = check().map_err(|e| {
            let msg = e.to_string();
            view.error = Some(msg.clone());
            SetupOutcome::Failed(msg)
        })?;
        view.busy = Some(action);
        Ok((wallet, checked))
    }

    /// Clear the busy flag, recording `error` if there is one.
    fn finish(&self, action: SetupAction, error: Option<&SpriteError>) {
        let mut view = lock(&self.view);
        view.busy = None;
        if let Some(e) = error {
            tracing::warn!(?action, error = %e, "vault setup failed");
            view.error = Some(e.to_string());
        }
    }

    fn on_step(&self, step: TxStep) {
        self.set_status(match step {
            TxStep::Signing => "Signing...",
            TxStep::Sending => "Sending...",
            TxStep::Confirming => "Confirming...",
        });
    }

    /// Create a vault from a fresh random seed, owned by the connected wallet.
    pub async fn create(&self, ctx: &WalletContext) -> SetupOutcome {
        let (wallet, ()) = match self.start(ctx, SetupAction::Create, || Ok(())) {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };
        match self.run_create(wallet.as_ref()).await {
            Ok((vault, signature)) => {
                tracing::info!(%vault, %signature, "vault created");
                {
                    let mut view = lock(&self.view);
                    view.status = Some(format!("Vault created! Address: {vault}"));
                    view.created_vault = Some(vault.clone());
                }
                self.finish(SetupAction::Create, None);
                SetupOutcome::Created { vault, signature }
            }
            Err(e) => {
                self.finish(SetupAction::Create, Some(&e));
                SetupOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_create(&self, wallet: &dyn WalletAdapter) -> Result<(String, String), SpriteError> {
        let owner = wallet.public_key().ok_or(SpriteError::WalletNotConnected)?;

        self.set_status("Generating vault seed...");
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);

        self.set_status("Preparing transaction...");
        let instruction = self.instructions.create(&seed, &owner).await?;
        let vault = chain_sol::bytes_to_address(&self.instructions.derive_vault(&seed)?);

        let signature = send_priority_transaction(
            self.api.as_ref(),
            wallet,
            &owner,
            instruction,
            CREATE_INS,
            &|step| self.on_step(step),
        )
        .await?;
        Ok((vault, signature))
    }

    /// Hand `vault` to `new_owner` and `new_withdraw_authority`, signed by the
    /// connected wallet as current owner. Addresses are base58; if any fails
    /// to parse nothing is built or sent.
    pub async fn edit(
        &self,
        ctx: &WalletContext,
        vault: &str,
        new_owner: &str,
        new_withdraw_authority: &str,
    ) -> SetupOutcome {
        let parse = || -> Result<[[u8; 32]; 3], SpriteError> {
            let key = |field: &str, value: &str| {
                chain_sol::address_to_bytes(value.trim())
                    .map_err(|e| SpriteError::InvalidPublicKeys(format!("{field}: {e}")))
            };
            Ok([
                key("vault", vault)?,
                key("new_owner", new_owner)?,
                key("new_withdraw_authority", new_withdraw_authority)?,
            ])
        };
        let (wallet, keys) = match self.start(ctx, SetupAction::Edit, parse) {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };
        match self.run_edit(wallet.as_ref(), keys).await {
            Ok(signature) => {
                tracing::info!(%vault, %signature, "vault edited");
                self.set_status(&format!("Vault edited! Signature: {signature}"));
                self.finish(SetupAction::Edit, None);
                SetupOutcome::Edited { signature }
            }
            Err(e) => {
                self.finish(SetupAction::Edit, Some(&e));
                SetupOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_edit(
        &self,
        wallet: &dyn WalletAdapter,
        [vault, new_owner, new_withdraw_authority]: [[u8; 32]; 3],
    ) -> Result<String, SpriteError> {
        let owner = wallet.public_key().ok_or(SpriteError::WalletNotConnected)?;

        self.set_status("Preparing transaction...");
        let instruction = self
            .instructions
            .edit(&vault, &owner, &new_owner, &new_withdraw_authority)
            .await?;

        send_priority_transaction(
            self.api.as_ref(),
            wallet,
            &owner,
            instruction,
            EDIT_INS,
            &|step| self.on_step(step),
        )
        .await
    }
}
