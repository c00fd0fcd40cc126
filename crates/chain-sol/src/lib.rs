//! Solana primitives for the sprite front-end core.
//!
//! Addresses, signatures, keypairs and the legacy transaction wire format,
//! implemented directly on `ed25519-dalek` and `bs58` rather than pulling in
//! `solana-sdk`.

pub mod address;
pub mod compute_budget;
pub mod error;
pub mod keypair;
pub mod signature;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, keypair_to_address, validate_address};
pub use compute_budget::{build_priority_transaction, set_compute_unit_price, COMPUTE_BUDGET_PROGRAM_ID};
pub use error::SolError;
pub use keypair::Keypair;
pub use signature::{decode_signature, encode_signature, verify_message, SIGNATURE_LEN};
pub use transaction::{
    compile_transaction, decode_compact_u16, encode_compact_u16, required_signers,
    serialize_message, serialize_unsigned, sign_raw_transaction, CompiledInstruction,
    SolAccountMeta, SolInstruction, SolTransaction,
};
