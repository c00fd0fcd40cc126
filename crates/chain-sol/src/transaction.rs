//! Legacy Solana transaction wire format.
//!
//! Deposit and withdrawal transactions are assembled here from the vault
//! instruction handed over by the vault SDK, then passed to the connected
//! wallet as unsigned wire bytes. Layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        program_id_index u8, compact-u16 + account
//!                           indices, compact-u16 + data
//! ```
//!
//! Transactions are built as legacy messages. Wallet-side signing also
//! accepts v0 messages, which carry a `0x80 | version` byte before the
//! header and address-table lookups after the instructions.

use crate::error::SolError;
use crate::keypair::Keypair;
use crate::signature::SIGNATURE_LEN;

// ---------------------------------------------------------------------------
// Compact-u16
// ---------------------------------------------------------------------------

/// Encode a `u16` in Solana's compact-u16 (7 bits per byte, high bit = more).
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut rest = value as u32;
    let mut out = Vec::with_capacity(3);
    loop {
        let low = (rest & 0x7f) as u8;
        rest >>= 7;
        if rest == 0 {
            out.push(low);
            return out;
        }
        out.push(low | 0x80);
    }
}

/// Decode a compact-u16 from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()));
        }
    }
    Err(SolError::SerializationError(
        "truncated compact-u16".into(),
    ))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// An account referenced by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

/// An instruction before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled transaction message.
#[derive(Debug, Clone)]
pub struct SolTransaction {
    /// Canonical order: writable signers (fee payer first), read-only
    /// signers, writable non-signers, read-only non-signers.
    pub account_keys: Vec<[u8; 32]>,
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub recent_blockhash: [u8; 32],
    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// An instruction whose accounts are indices into `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile instructions into a message paid for by `fee_payer`.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if instructions.is_empty() {
        return Err(SolError::TransactionBuildError("no instructions".into()));
    }

    // (pubkey, signer, writable); lists are tiny so a Vec is enough.
    let mut accounts: Vec<([u8; 32], bool, bool)> = vec![(*fee_payer, true, true)];
    let mut merge = |key: [u8; 32], signer: bool, writable: bool| {
        match accounts.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => {
                entry.1 |= signer;
                entry.2 |= writable;
            }
            None => accounts.push((key, signer, writable)),
        }
    };
    for ix in instructions {
        for meta in &ix.accounts {
            merge(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        merge(ix.program_id, false, false);
    }

    // Stable sort keeps the fee payer at index 0: it is a writable signer
    // and was inserted first.
    accounts.sort_by_key(|(_, signer, writable)| match (signer, writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if accounts.len() > u8::MAX as usize {
        return Err(SolError::TransactionBuildError(format!(
            "too many accounts: {}",
            accounts.len()
        )));
    }

    let count = |pred: fn(&([u8; 32], bool, bool)) -> bool| {
        accounts.iter().filter(|a| pred(a)).count() as u8
    };
    let num_required_signatures = count(|a| a.1);
    let num_readonly_signed = count(|a| a.1 && !a.2);
    let num_readonly_unsigned = count(|a| !a.1 && !a.2);

    let account_keys: Vec<[u8; 32]> = accounts.iter().map(|(k, _, _)| *k).collect();
    let index_of = |key: &[u8; 32]| -> Result<u8, SolError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError("account not in account keys".into()))
    };

    let compiled_instructions = instructions
        .iter()
        .map(|ix| {
            Ok(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indices: ix
                    .accounts
                    .iter()
                    .map(|m| index_of(&m.pubkey))
                    .collect::<Result<_, _>>()?,
                data: ix.data.clone(),
            })
        })
        .collect::<Result<Vec<_>, SolError>>()?;

    Ok(SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions,
    })
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize the message (the bytes every signer signs).
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);
    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend(compact_len(tx.account_keys.len(), "account keys")?);
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }
    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend(compact_len(tx.compiled_instructions.len(), "instructions")?);
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);
        buf.extend(compact_len(ix.account_indices.len(), "instruction accounts")?);
        buf.extend_from_slice(&ix.account_indices);
        buf.extend(compact_len(ix.data.len(), "instruction data bytes")?);
        buf.extend_from_slice(&ix.data);
    }
    Ok(buf)
}

/// Serialize a transaction with every signature slot zeroed, ready to be
/// handed to a wallet for signing.
pub fn serialize_unsigned(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let message = serialize_message(tx)?;
    let slots = tx.num_required_signatures as usize;
    let mut wire = encode_compact_u16(slots as u16);
    wire.resize(wire.len() + slots * SIGNATURE_LEN, 0);
    wire.extend_from_slice(&message);
    Ok(wire)
}

/// Split wire bytes into (signature slot offset, slot count, message).
fn split_wire(raw_tx: &[u8]) -> Result<(usize, usize, &[u8]), SolError> {
    let (num_sigs, prefix) = decode_compact_u16(raw_tx)?;
    let sigs_end = prefix + num_sigs as usize * SIGNATURE_LEN;
    if sigs_end > raw_tx.len() {
        return Err(SolError::SerializationError(
            "signature slots exceed transaction length".into(),
        ));
    }
    Ok((prefix, num_sigs as usize, &raw_tx[sigs_end..]))
}

/// High bit of the first message byte marks a versioned message.
const VERSION_PREFIX_MASK: u8 = 0x80;

/// Offset of the message header: 0 for legacy, 1 for v0. Other versions
/// are rejected.
fn header_offset(message: &[u8]) -> Result<usize, SolError> {
    match message.first() {
        None => Err(SolError::SerializationError("message too short".into())),
        Some(&b) if b & VERSION_PREFIX_MASK == 0 => Ok(0),
        Some(&b) if b & !VERSION_PREFIX_MASK == 0 => Ok(1),
        Some(&b) => Err(SolError::SerializationError(format!(
            "unsupported message version {}",
            b & !VERSION_PREFIX_MASK
        ))),
    }
}

/// Public keys of the required signers of a wire-format transaction,
/// legacy or v0.
pub fn required_signers(raw_tx: &[u8]) -> Result<Vec<[u8; 32]>, SolError> {
    let (_, _, message) = split_wire(raw_tx)?;
    let message = &message[header_offset(message)?..];
    if message.len() < 4 {
        return Err(SolError::SerializationError("message too short".into()));
    }
    let required = message[0] as usize;
    let (num_accounts, prefix) = decode_compact_u16(&message[3..])?;
    let keys_start = 3 + prefix;
    let keys_end = keys_start + num_accounts as usize * 32;
    if keys_end > message.len() || required > num_accounts as usize {
        return Err(SolError::SerializationError(
            "message too short for account keys".into(),
        ));
    }

    Ok(message[keys_start..keys_start + required * 32]
        .chunks_exact(32)
        .filter_map(|chunk| chunk.try_into().ok())
        .collect())
}

/// Sign a wire-format transaction, filling the slot that belongs to
/// `keypair`. Other signatures are left untouched.
pub fn sign_raw_transaction(keypair: &Keypair, raw_tx: &[u8]) -> Result<Vec<u8>, SolError> {
    let ours = keypair.public_key();
    let slot = required_signers(raw_tx)?
        .iter()
        .position(|k| *k == ours)
        .ok_or_else(|| {
            SolError::SigningError("wallet pubkey not found in transaction signers".into())
        })?;

    let (sigs_start, num_sigs, message) = split_wire(raw_tx)?;
    if slot >= num_sigs {
        return Err(SolError::SigningError(
            "signer has no signature slot".into(),
        ));
    }
    let signature = keypair.sign_message(message);

    let mut signed = raw_tx.to_vec();
    let offset = sigs_start + slot * SIGNATURE_LEN;
    signed[offset..offset + SIGNATURE_LEN].copy_from_slice(&signature);
    Ok(signed)
}
