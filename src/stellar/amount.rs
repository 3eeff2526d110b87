// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decimal amount handling.
//!
//! Amounts travel as decimal strings end to end. The only numeric form is the
//! ledger's integer stroop count (1 unit = 10^7 stroops); floats never appear.

/// Number of decimal places of a Stellar amount.
pub const STROOP_DECIMALS: u32 = 7;

const STROOPS_PER_UNIT: i64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is required")]
    Empty,

    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max 7)")]
    TooManyDecimals,

    #[error("Amount must be greater than zero")]
    NotPositive,

    #[error("Amount overflow")]
    Overflow,
}

/// Parse a non-negative decimal amount into stroops.
///
/// Accepts `"10"`, `"10.5"` and Horizon's fixed format `"9.9000000"`.
/// Rejects signs, exponents, empty parts and more than 7 decimals.
pub fn parse_amount(amount: &str) -> Result<i64, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (amount, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }

    let whole = whole
        .parse::<i64>()
        .map_err(|_| AmountError::Overflow)?;

    let fraction = match fraction {
        Some(f) => {
            if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AmountError::InvalidFormat(amount.to_string()));
            }
            if f.len() > STROOP_DECIMALS as usize {
                return Err(AmountError::TooManyDecimals);
            }
            // Pad with zeros to match decimals
            let padded = format!("{:0<width$}", f, width = STROOP_DECIMALS as usize);
            padded
                .parse::<i64>()
                .map_err(|_| AmountError::InvalidFormat(amount.to_string()))?
        }
        None => 0,
    };

    whole
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Parse an amount that must be strictly positive (payments, deposits).
pub fn parse_positive_amount(amount: &str) -> Result<i64, AmountError> {
    match parse_amount(amount)? {
        0 => Err(AmountError::NotPositive),
        stroops => Ok(stroops),
    }
}

/// Format stroops as a trimmed decimal string (`100000000` → `"10"`).
pub fn format_amount(stroops: i64) -> String {
    let whole = stroops / STROOPS_PER_UNIT;
    let remainder = (stroops % STROOPS_PER_UNIT).abs();

    if remainder == 0 {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = STROOP_DECIMALS as usize);
    let trimmed = decimal_str.trim_end_matches('0');
    let sign = if stroops < 0 && whole == 0 { "-" } else { "" };
    format!("{sign}{whole}.{trimmed}")
}

/// Canonical decimal form of a positive amount (`"010.50"` → `"10.5"`).
pub fn normalize_amount(amount: &str) -> Result<String, AmountError> {
    parse_positive_amount(amount).map(format_amount)
}
