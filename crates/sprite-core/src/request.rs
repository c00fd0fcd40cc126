//! Link request validation and the query strings that carry link proofs
//! between the sign page and the complete page.

use chain_sol::{address_to_bytes, decode_signature, verify_message};
use url::form_urlencoded;

use crate::error::SpriteError;
use crate::message::build_link_message;
use crate::types::Platform;

/// Route of the page that turns a proof into a bot command.
pub const LINK_COMPLETE_PATH: &str = "/link-complete";

/// Query parameter carrying the account id on the complete page. The bot
/// still generates links with this name for Telegram ids too.
pub const PROOF_ACCOUNT_PARAM: &str = "discord_id";

pub(crate) fn query_param(query: &str, name: &str) -> String {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// A well-formed request to link `wallet` to `account_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    wallet: String,
    wallet_bytes: [u8; 32],
    account_id: String,
    timestamp: String,
    timestamp_value: u64,
}

impl LinkRequest {
    /// Check all three fields. Nothing is partially accepted.
    pub fn validate(wallet: &str, account_id: &str, timestamp: &str) -> Result<Self, SpriteError> {
        let wallet_bytes = address_to_bytes(wallet)
            .map_err(|e| SpriteError::InvalidWalletKind(e.to_string()))?;

        if account_id.is_empty() {
            return Err(SpriteError::MissingAccountId);
        }

        let timestamp_value = parse_timestamp(timestamp)?;

        Ok(Self {
            wallet: wallet.to_owned(),
            wallet_bytes,
            account_id: account_id.to_owned(),
            timestamp: timestamp.to_owned(),
            timestamp_value,
        })
    }

    /// Read `wallet`, `id` and `timestamp` from the sign page's query string.
    pub fn from_query(query: &str) -> Result<Self, SpriteError> {
        Self::validate(
            &query_param(query, "wallet"),
            &query_param(query, "id"),
            &query_param(query, "timestamp"),
        )
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    pub fn wallet_bytes(&self) -> &[u8; 32] {
        &self.wallet_bytes
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Timestamp exactly as received.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn timestamp_value(&self) -> u64 {
        self.timestamp_value
    }

    pub fn platform(&self) -> Platform {
        Platform::from_account_id(&self.account_id)
    }

    /// The message the wallet is asked to sign.
    pub fn message(&self) -> String {
        build_link_message(&self.wallet, &self.account_id, &self.timestamp)
    }

    /// Attach a wallet signature, echoing every other field unchanged.
    pub fn into_proof(self, signature: &[u8; 64]) -> SignedLinkProof {
        SignedLinkProof {
            wallet: self.wallet,
            signature: chain_sol::encode_signature(signature),
            timestamp: self.timestamp,
            account_id: self.account_id,
        }
    }
}

/// Unsigned 64-bit decimal. Freshness is the bot's business.
fn parse_timestamp(timestamp: &str) -> Result<u64, SpriteError> {
    if timestamp.is_empty() {
        return Err(SpriteError::MissingTimestamp);
    }
    if !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SpriteError::InvalidTimestamp(format!(
            "not a decimal number: {timestamp}"
        )));
    }
    timestamp
        .parse::<u64>()
        .map_err(|e| SpriteError::InvalidTimestamp(e.to_string()))
}

/// Command the user should run to get a fresh link.
pub fn invalid_link_hint(account_id: &str) -> String {
    format!("{}link", Platform::from_account_id(account_id).command_prefix())
}

/// A signed link, as carried in the complete page's query string.
///
/// Fields are kept in their textual transport form; `LinkCommand::from_proof`
/// decodes and checks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLinkProof {
    pub wallet: String,
    /// Base58 Ed25519 signature over the link message.
    pub signature: String,
    pub timestamp: String,
    pub account_id: String,
}

impl SignedLinkProof {
    pub fn from_query(query: &str) -> Self {
        Self {
            wallet: query_param(query, "wallet"),
            signature: query_param(query, "signature"),
            timestamp: query_param(query, "timestamp"),
            account_id: query_param(query, PROOF_ACCOUNT_PARAM),
        }
    }

    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("wallet", &self.wallet)
            .append_pair("signature", &self.signature)
            .append_pair("timestamp", &self.timestamp)
            .append_pair(PROOF_ACCOUNT_PARAM, &self.account_id)
            .finish()
    }

    /// Relative URL of the complete page for this proof.
    pub fn redirect_url(&self) -> String {
        format!("{LINK_COMPLETE_PATH}?{}", self.to_query())
    }

    pub fn platform(&self) -> Platform {
        Platform::from_account_id(&self.account_id)
    }

    /// Check the signature against the rebuilt link message.
    pub fn verify(&self) -> Result<(), SpriteError> {
        let pubkey = address_to_bytes(&self.wallet)
            .map_err(|e| SpriteError::InvalidWalletKind(e.to_string()))?;
        let signature =
            decode_signature(&self.signature).map_err(|e| SpriteError::CorruptProof(e.to_string()))?;
        let message = build_link_message(&self.wallet, &self.account_id, &self.timestamp);
        verify_message(&pubkey, message.as_bytes(), &signature)
            .map_err(|e| SpriteError::CorruptProof(e.to_string()))
    }
}
