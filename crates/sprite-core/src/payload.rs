//! The `link complete` command payload.
//!
//! ```text
//! offset  len  field
//!      0   32  wallet public key
//!     32   64  signature
//!     96    8  timestamp, u64 little-endian
//! ```
//!
//! The 104 bytes travel base64-encoded (standard alphabet, padded) after a
//! platform-specific `link complete` command.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_sol::{address_to_bytes, decode_signature};

use crate::error::SpriteError;
use crate::request::SignedLinkProof;
use crate::types::Platform;

pub const PAYLOAD_LEN: usize = 104;
const WALLET_OFFSET: usize = 0;
const SIGNATURE_OFFSET: usize = 32;
const TIMESTAMP_OFFSET: usize = 96;

/// Command word following the platform prefix.
pub const LINK_COMPLETE_COMMAND: &str = "link complete";

/// Fixed 104-byte proof record. Immutable once built.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LinkCommandPayload([u8; PAYLOAD_LEN]);

impl LinkCommandPayload {
    pub fn new(wallet: &[u8; 32], signature: &[u8; 64], timestamp: u64) -> Self {
        let mut buf = [0u8; PAYLOAD_LEN];
        buf[WALLET_OFFSET..SIGNATURE_OFFSET].copy_from_slice(wallet);
        buf[SIGNATURE_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(signature);
        buf[TIMESTAMP_OFFSET..].copy_from_slice(&timestamp.to_le_bytes());
        Self(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpriteError> {
        let buf: [u8; PAYLOAD_LEN] = bytes.try_into().map_err(|_| {
            SpriteError::CorruptProof(format!(
                "expected {PAYLOAD_LEN} payload bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(buf))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SpriteError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| SpriteError::CorruptProof(format!("base64 decode failed: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }

    pub fn wallet(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.0[WALLET_OFFSET..SIGNATURE_OFFSET]);
        out
    }

    pub fn signature(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.0[SIGNATURE_OFFSET..TIMESTAMP_OFFSET]);
        out
    }

    pub fn timestamp(&self) -> u64 {
        let mut out = [0u8; 8];
        out.copy_from_slice(&self.0[TIMESTAMP_OFFSET..]);
        u64::from_le_bytes(out)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for LinkCommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCommandPayload")
            .field("wallet", &chain_sol::bytes_to_address(&self.wallet()))
            .field("timestamp", &self.timestamp())
            .finish_non_exhaustive()
    }
}

/// A ready-to-paste bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCommand {
    pub platform: Platform,
    pub payload: LinkCommandPayload,
}

impl LinkCommand {
    /// Pack a proof. Every decode failure is reported as `CorruptProof` so
    /// the page never shows a half-built command.
    pub fn from_proof(proof: &SignedLinkProof) -> Result<Self, SpriteError> {
        let wallet = address_to_bytes(&proof.wallet)
            .map_err(|e| SpriteError::CorruptProof(e.to_string()))?;
        let signature = decode_signature(&proof.signature)
            .map_err(|e| SpriteError::CorruptProof(e.to_string()))?;
        let timestamp = proof
            .timestamp
            .parse::<u64>()
            .map_err(|e| SpriteError::CorruptProof(format!("timestamp: {e}")))?;

        Ok(Self {
            platform: proof.platform(),
            payload: LinkCommandPayload::new(&wallet, &signature, timestamp),
        })
    }

    /// Parse `{prefix}link complete {base64}`.
    pub fn parse(command: &str) -> Result<Self, SpriteError> {
        let (platform, rest) = [Platform::Telegram, Platform::Discord]
            .into_iter()
            .find_map(|p| command.strip_prefix(p.command_prefix()).map(|rest| (p, rest)))
            .ok_or_else(|| SpriteError::CorruptProof("unknown command prefix".into()))?;
        let encoded = rest
            .strip_prefix(LINK_COMPLETE_COMMAND)
            .and_then(|r| r.strip_prefix(' '))
            .ok_or_else(|| SpriteError::CorruptProof("not a link complete command".into()))?;

        Ok(Self {
            platform,
            payload: LinkCommandPayload::from_base64(encoded)?,
        })
    }
}

impl fmt::Display for LinkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{LINK_COMPLETE_COMMAND} {}",
            self.platform.command_prefix(),
            self.payload.to_base64()
        )
    }
}

/// Build the command for the complete page's query string.
pub fn link_command_from_query(query: &str) -> Result<LinkCommand, SpriteError> {
    let proof = SignedLinkProof::from_query(query);
    let command = LinkCommand::from_proof(&proof);
    if let Err(e) = &command {
        tracing::warn!(error = ?e, "failed to generate link command");
    }
    command
}
