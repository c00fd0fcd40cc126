use thiserror::Error;

/// Solana primitive errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_secret_key() {
        let err = SolError::InvalidSecretKey("expected 64 bytes, got 12".into());
        assert_eq!(
            err.to_string(),
            "invalid secret key: expected 64 bytes, got 12"
        );
    }

    #[test]
    fn display_invalid_address() {
        let err = SolError::InvalidAddress("bad decode".into());
        assert_eq!(err.to_string(), "invalid address: bad decode");
    }

    #[test]
    fn display_invalid_signature() {
        let err = SolError::InvalidSignature("expected 64 bytes, got 63".into());
        assert_eq!(
            err.to_string(),
            "invalid signature: expected 64 bytes, got 63"
        );
    }

    #[test]
    fn display_verification_failed() {
        assert_eq!(
            SolError::VerificationFailed.to_string(),
            "signature verification failed"
        );
    }

    #[test]
    fn display_serialization_error() {
        let err = SolError::SerializationError("compact-u16 overflow".into());
        assert_eq!(
            err.to_string(),
            "serialization error: compact-u16 overflow"
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(SolError::SigningError("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
