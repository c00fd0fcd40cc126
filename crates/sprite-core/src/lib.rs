//! Front-end core for linking chat accounts to Solana wallets and moving
//! funds through the sprite vault.
//!
//! Page logic lives in [`link_flow`], [`payment_flow`] and [`setup_flow`];
//! wallets are injected through a [`wallet::WalletContext`].

pub mod amount;
pub mod api;
pub mod config;
pub mod error;
pub mod keypair_wallet;
pub mod keystore;
pub mod link_flow;
pub mod logging;
pub mod message;
pub mod payload;
pub mod payment_flow;
pub mod request;
pub mod setup_flow;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use amount::{extract_amount, PaymentAmount};
pub use api::{HttpApi, SpriteApi, TxContext};
pub use config::SpriteConfig;
pub use error::SpriteError;
pub use keypair_wallet::KeypairWalletAdapter;
pub use link_flow::{LinkSigner, SignOutcome, SignState};
pub use payload::{LinkCommand, LinkCommandPayload};
pub use payment_flow::{PaymentCompletion, PaymentFlow, PaymentRequest, VaultInstructions};
pub use request::{LinkRequest, SignedLinkProof};
pub use setup_flow::{SetupAction, SetupFlow, SetupOutcome, SetupView};
pub use types::{PaymentKind, Platform};
pub use wallet::{MessageSigner, TransactionSigner, WalletAdapter, WalletContext};

uniffi::setup_scaffolding!();

// ─── UniFFI-exported functions ───────────────────────────────────────
// UniFFI passes owned strings across FFI.

/// Message a wallet signs to prove it belongs to `account_id`.
#[uniffi::export]
pub fn build_link_message(wallet: String, account_id: String, timestamp: String) -> String {
    message::build_link_message(&wallet, &account_id, &timestamp)
}

/// Check sign-page parameters.
#[uniffi::export]
pub fn validate_link_request(
    wallet: String,
    account_id: String,
    timestamp: String,
) -> Result<bool, SpriteError> {
    LinkRequest::validate(&wallet, &account_id, &timestamp).map(|_| true)
}

/// The bot command for a complete-page query string.
#[uniffi::export]
pub fn link_command_from_query(query: String) -> Result<String, SpriteError> {
    payload::link_command_from_query(&query).map(|cmd| cmd.to_string())
}

/// Raw base units stored in a payment id; 0 if the id is malformed.
#[uniffi::export]
pub fn extract_payment_amount(payment_id: String) -> u64 {
    extract_amount(&payment_id).raw
}

#[uniffi::export]
pub fn format_payment_amount(raw: u64, decimals: u32) -> String {
    PaymentAmount::from_raw(raw).format(decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_message_matches_module() {
        assert_eq!(
            build_link_message("W".into(), "98765".into(), "1".into()),
            "Link wallet W to ivy-sprite user 98765 at 1"
        );
    }

    #[test]
    fn exported_validation_surfaces_errors() {
        assert!(validate_link_request(
            "11111111111111111111111111111111".into(),
            "tg:12345".into(),
            "1700000000".into()
        )
        .unwrap());
        assert!(matches!(
            validate_link_request("".into(), "tg:1".into(), "1".into()),
            Err(SpriteError::InvalidWalletKind(_))
        ));
    }

    #[test]
    fn exported_amount_helpers() {
        let id = format!("{}00ca9a3b00000000", "0".repeat(48));
        let raw = extract_payment_amount(id);
        assert_eq!(raw, 1_000_000_000);
        assert_eq!(format_payment_amount(raw, 2), "1.00");
        assert_eq!(extract_payment_amount("xyz".into()), 0);
    }

    #[test]
    fn exported_command_rejects_empty_query() {
        let err = link_command_from_query(String::new()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate linking command");
    }
}
