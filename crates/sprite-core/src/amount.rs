//! Token amounts carried inside payment ids.
//!
//! A payment id is 32 bytes of hex; its last 8 bytes are the amount as a
//! little-endian u64 in base units (9 decimals).

use std::fmt;

/// Base units per whole token.
pub const AMOUNT_SCALE: u64 = 1_000_000_000;
pub const AMOUNT_DECIMALS: u32 = 9;

const PAYMENT_ID_HEX_LEN: usize = 64;

/// A fixed-point amount in base units. Formatting is for display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaymentAmount {
    pub raw: u64,
}

impl PaymentAmount {
    pub const ZERO: PaymentAmount = PaymentAmount { raw: 0 };

    pub fn from_raw(raw: u64) -> Self {
        Self { raw }
    }

    /// Lossy for amounts above 2^53 base units.
    pub fn as_f64(&self) -> f64 {
        self.raw as f64 / AMOUNT_SCALE as f64
    }

    /// Decimal string with `decimals` places, rounded half-up.
    pub fn format(&self, decimals: u32) -> String {
        let decimals = decimals.min(AMOUNT_DECIMALS);
        let step = 10u128.pow(AMOUNT_DECIMALS - decimals);
        let rounded = (self.raw as u128 + step / 2) / step;
        let unit = 10u128.pow(decimals);
        let whole = rounded / unit;
        if decimals == 0 {
            return whole.to_string();
        }
        let frac = rounded % unit;
        format!("{whole}.{frac:0width$}", width = decimals as usize)
    }
}

impl fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(AMOUNT_DECIMALS))
    }
}

/// Amount stored in a payment id, or zero when the id is not 64 hex chars.
pub fn extract_amount(payment_id_hex: &str) -> PaymentAmount {
    if payment_id_hex.len() != PAYMENT_ID_HEX_LEN {
        return PaymentAmount::ZERO;
    }
    let Some(tail) = payment_id_hex.get(PAYMENT_ID_HEX_LEN - 16..) else {
        return PaymentAmount::ZERO;
    };
    let mut raw = [0u8; 8];
    match hex::decode_to_slice(tail, &mut raw) {
        Ok(()) => PaymentAmount::from_raw(u64::from_le_bytes(raw)),
        Err(_) => PaymentAmount::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_with_tail(tail: &str) -> String {
        format!("{}{tail}", "0".repeat(48))
    }

    #[test]
    fn one_token() {
        let amount = extract_amount(&id_with_tail("00ca9a3b00000000"));
        assert_eq!(amount.raw, 1_000_000_000);
        assert_eq!(amount.as_f64(), 1.0);
        assert_eq!(amount.format(2), "1.00");
    }

    #[test]
    fn wrong_length_is_zero() {
        assert_eq!(extract_amount(""), PaymentAmount::ZERO);
        assert_eq!(extract_amount("00ca9a3b00000000"), PaymentAmount::ZERO);
        assert_eq!(extract_amount(&format!("{}0", id_with_tail("00ca9a3b00000000"))), PaymentAmount::ZERO);
    }

    #[test]
    fn non_hex_tail_is_zero() {
        assert_eq!(extract_amount(&id_with_tail("zzca9a3b00000000")), PaymentAmount::ZERO);
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        // 64 bytes but the tail would split a UTF-8 character.
        let id = format!("{}é{}", "0".repeat(47), "0".repeat(15));
        assert_eq!(id.len(), 64);
        assert_eq!(extract_amount(&id), PaymentAmount::ZERO);
    }

    #[test]
    fn uppercase_hex_accepted() {
        let amount = extract_amount(&id_with_tail("00CA9A3B00000000"));
        assert_eq!(amount.raw, AMOUNT_SCALE);
    }

    #[test]
    fn formatting_rounds_half_up() {
        let amount = PaymentAmount::from_raw(1_234_567_890);
        assert_eq!(amount.format(2), "1.23");
        assert_eq!(amount.format(4), "1.2346");
        assert_eq!(amount.format(0), "1");
        assert_eq!(amount.to_string(), "1.234567890");
        assert_eq!(PaymentAmount::from_raw(995_000_000).format(2), "1.00");
    }

    #[test]
    fn max_amount_formats_exactly() {
        let amount = PaymentAmount::from_raw(u64::MAX);
        assert_eq!(amount.to_string(), "18446744073.709551615");
    }
}
