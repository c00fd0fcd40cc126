//! Ed25519 signatures in their Base58 transport form.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::SolError;

/// Length of a raw Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Decode a Base58 signature. Anything other than 64 bytes is rejected.
pub fn decode_signature(encoded: &str) -> Result<[u8; SIGNATURE_LEN], SolError> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| SolError::InvalidSignature(format!("base58 decode failed: {e}")))?;

    signature_from_slice(&bytes)
}

/// Copy a raw signature out of a slice, enforcing the 64-byte length.
pub fn signature_from_slice(bytes: &[u8]) -> Result<[u8; SIGNATURE_LEN], SolError> {
    bytes.try_into().map_err(|_| {
        SolError::InvalidSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Encode a raw signature as Base58.
pub fn encode_signature(signature: &[u8; SIGNATURE_LEN]) -> String {
    bs58::encode(signature).into_string()
}

/// Verify `signature` over `message` against a 32-byte public key.
pub fn verify_message(
    pubkey: &[u8; 32],
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), SolError> {
    let key = VerifyingKey::from_bytes(pubkey)
        .map_err(|e| SolError::InvalidPublicKey(e.to_string()))?;
    let sig = Signature::from_bytes(signature);
    key.verify(message, &sig)
        .map_err(|_| SolError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    #[test]
    fn decode_accepts_64_bytes() {
        let raw = [9u8; 64];
        let encoded = encode_signature(&raw);
        assert_eq!(decode_signature(&encoded).unwrap(), raw);
    }

    #[test]
    fn decode_rejects_63_bytes() {
        let encoded = bs58::encode([9u8; 63]).into_string();
        let err = decode_signature(&encoded).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid signature: expected 64 bytes, got 63"
        );
    }

    #[test]
    fn decode_rejects_65_bytes() {
        let encoded = bs58::encode([9u8; 65]).into_string();
        assert!(decode_signature(&encoded).is_err());
    }

    #[test]
    fn decode_rejects_non_base58() {
        // '0' and 'l' are outside the Base58 alphabet.
        assert!(matches!(
            decode_signature("0l0l"),
            Err(SolError::InvalidSignature(_))
        ));
    }

    #[test]
    fn verify_good_signature() {
        let key = signing_key();
        let message = b"hello sprite";
        let sig = key.sign(message).to_bytes();
        let pubkey = key.verifying_key().to_bytes();
        assert!(verify_message(&pubkey, message, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let key = signing_key();
        let sig = key.sign(b"hello sprite").to_bytes();
        let pubkey = key.verifying_key().to_bytes();
        assert!(matches!(
            verify_message(&pubkey, b"hello sprit3", &sig),
            Err(SolError::VerificationFailed)
        ));
    }
}
