use thiserror::Error;

#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SpriteError {
    // Link parameters
    #[error("Invalid wallet: {0}")]
    InvalidWalletKind(String),

    #[error("Missing account id")]
    MissingAccountId,

    #[error("Missing timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // Wallet session
    #[error("Please connect the wallet: {0}")]
    WalletMismatch(String),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Wallet does not support message signing")]
    MessageSigningUnsupported,

    #[error("Wallet does not support transaction signing")]
    TransactionSigningUnsupported,

    /// Rejections and transport failures, shown verbatim.
    #[error("{0}")]
    Wallet(String),

    #[error("{0}")]
    Api(String),

    // Post-signature encoding
    #[error("Failed to generate linking command")]
    CorruptProof(String),

    /// Shown verbatim on the completion page.
    #[error("{0}")]
    InvalidPayment(String),

    #[error("Invalid public key(s)")]
    InvalidPublicKeys(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SpriteError {
    /// True for failures that render the static "invalid link" view.
    pub fn is_invalid_link(&self) -> bool {
        matches!(
            self,
            SpriteError::InvalidWalletKind(_)
                | SpriteError::MissingAccountId
                | SpriteError::MissingTimestamp
                | SpriteError::InvalidTimestamp(_)
        )
    }
}

impl From<chain_sol::error::SolError> for SpriteError {
    fn from(e: chain_sol::error::SolError) -> Self {
        SpriteError::Wallet(e.to_string())
    }
}

impl From<reqwest::Error> for SpriteError {
    fn from(e: reqwest::Error) -> Self {
        SpriteError::Api(e.to_string())
    }
}
