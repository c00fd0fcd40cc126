//! Compute-budget program and priority-fee transaction assembly.

use crate::error::SolError;
use crate::transaction::{compile_transaction, SolInstruction, SolTransaction};

/// `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: [u8; 32] = [
    0x03, 0x06, 0x46, 0x6f, 0xe5, 0x21, 0x17, 0x32, 0xff, 0xec, 0xad, 0xba, 0x72, 0xc3, 0x9b,
    0xe7, 0xbc, 0x8c, 0xe5, 0xbb, 0xc5, 0xf7, 0x12, 0x6b, 0x2c, 0x43, 0x9b, 0x3a, 0x40, 0x00,
    0x00, 0x00,
];

/// Instruction discriminator of `SetComputeUnitPrice`.
const SET_COMPUTE_UNIT_PRICE: u8 = 3;

/// `SetComputeUnitPrice(micro_lamports)`: no accounts, u64 LE payload.
pub fn set_compute_unit_price(micro_lamports: u64) -> SolInstruction {
    let mut data = Vec::with_capacity(9);
    data.push(SET_COMPUTE_UNIT_PRICE);
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    SolInstruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    }
}

/// Compile `instruction` behind a compute-unit-price instruction, paid for
/// by `fee_payer`.
pub fn build_priority_transaction(
    instruction: SolInstruction,
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
    priority_fee_micro_lamports: u64,
) -> Result<SolTransaction, SolError> {
    let instructions = [set_compute_unit_price(priority_fee_micro_lamports), instruction];
    compile_transaction(&instructions, fee_payer, recent_blockhash)
}
