//! Sign page state machine: `Idle -> Signing -> {Idle + error, Redirected}`.
//!
//! The state lives behind a mutex and is checked and advanced in one step,
//! so a second `sign` call while a signature is pending is a no-op no matter
//! how the UI wires its button.

use std::sync::Mutex;

use crate::error::SpriteError;
use crate::keystore::lock;
use crate::request::LinkRequest;
use crate::wallet::WalletContext;

const SIGN_FAILED: &str = "Failed to sign message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignState {
    Idle,
    Signing,
    /// Terminal: holds the complete-page URL.
    Redirected(String),
}

#[derive(Debug)]
pub enum SignOutcome {
    /// No wallet connected; the wallet picker was opened.
    ConnectRequested,
    /// A signature is already pending.
    AlreadySigning,
    /// Signing was not attempted. Also recorded as the page error.
    Blocked(SpriteError),
    /// The wallet failed or the user rejected; back to `Idle`.
    Failed(String),
    Redirected(String),
}

#[derive(Debug)]
pub struct LinkSigner {
    request: LinkRequest,
    state: Mutex<SignState>,
    error: Mutex<Option<String>>,
}

impl LinkSigner {
    pub fn new(request: LinkRequest) -> Self {
        Self {
            request,
            state: Mutex::new(SignState::Idle),
            error: Mutex::new(None),
        }
    }

    /// Build from the sign page's query string. Invalid links never get a
    /// signer.
    pub fn from_query(query: &str) -> Result<Self, SpriteError> {
        LinkRequest::from_query(query).map(Self::new)
    }

    pub fn request(&self) -> &LinkRequest {
        &self.request
    }

    pub fn state(&self) -> SignState {
        lock(&self.state).clone()
    }

    /// Last error to display, if any.
    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    fn set_error(&self, message: Option<String>) {
        *lock(&self.error) = message;
    }

    /// Exact textual match between the connected key and the link's wallet.
    pub fn wallet_matches(&self, ctx: &WalletContext) -> bool {
        ctx.public_key().as_deref() == Some(self.request.wallet())
    }

    pub fn button_label(&self, ctx: &WalletContext) -> &'static str {
        match self.state() {
            SignState::Signing => "Signing...",
            SignState::Redirected(_) => "Redirecting...",
            SignState::Idle if ctx.public_key().is_none() => "Connect Wallet",
            SignState::Idle if !self.wallet_matches(ctx) => "Wrong Wallet Connected",
            SignState::Idle => "Sign Message",
        }
    }

    pub fn button_disabled(&self, ctx: &WalletContext) -> bool {
        match self.state() {
            SignState::Idle => ctx.public_key().is_some() && !self.wallet_matches(ctx),
            _ => true,
        }
    }

    /// Ask the connected wallet to sign the link message.
    pub async fn sign(&self, ctx: &WalletContext) -> SignOutcome {
        let wallet = {
            let mut state = lock(&self.state);
            match &*state {
                SignState::Idle => {}
                SignState::Signing => return SignOutcome::AlreadySigning,
                SignState::Redirected(url) => return SignOutcome::Redirected(url.clone()),
            }

            let Some(wallet) = ctx.connected() else {
                ctx.open_modal();
                return SignOutcome::ConnectRequested;
            };
            if !self.wallet_matches(ctx) {
                return self.block(SpriteError::WalletMismatch(self.request.wallet().to_owned()));
            }
            if wallet.message_signer().is_none() {
                return self.block(SpriteError::MessageSigningUnsupported);
            }

            *state = SignState::Signing;
            wallet
        };
        self.set_error(None);

        tracing::info!(
            wallet = self.request.wallet(),
            account_id = self.request.account_id(),
            "requesting link signature"
        );

        let message = self.request.message();
        let result = match wallet.message_signer() {
            Some(signer) => signer.sign_message(message.as_bytes()).await,
            None => Err(SpriteError::MessageSigningUnsupported),
        };

        match result {
            Ok(signature) => {
                let url = self.request.clone().into_proof(&signature).redirect_url();
                *lock(&self.state) = SignState::Redirected(url.clone());
                SignOutcome::Redirected(url)
            }
            Err(e) => {
                let mut message = e.to_string();
                if message.is_empty() {
                    message = SIGN_FAILED.to_owned();
                }
                tracing::warn!(error = %message, "link signature failed");
                self.set_error(Some(message.clone()));
                *lock(&self.state) = SignState::Idle;
                SignOutcome::Failed(message)
            }
        }
    }

    fn block(&self, err: SpriteError) -> SignOutcome {
        tracing::debug!(error = %err, "link signing blocked");
        self.set_error(Some(err.to_string()));
        SignOutcome::Blocked(err)
    }
}
