//! Amount parsing and swap validation.
//!
//! Decimal strings are converted to smallest units with exact integer
//! arithmetic. Digits beyond the token's precision are dropped (floor), so a
//! converted amount never exceeds what the user typed.

use solana_sdk::pubkey::Pubkey;
use std::fmt;

use crate::common::{TokenHolding, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    Unparsable,
    Negative,
    /// Larger than any representable balance
    Overflow,
}

/// Token quantity in smallest units, paired with the token's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAmount {
    units: u64,
    decimals: u8,
}

impl SwapAmount {
    pub fn from_units(units: u64, decimals: u8) -> Self {
        Self { units, decimals }
    }

    /// Parse a user-typed decimal string such as `"0.5"`, `"12"` or `".25"`.
    pub fn parse(amount: &str, decimals: u8) -> Result<Self, AmountError> {
        let amount = amount.trim();
        if let Some(rest) = amount.strip_prefix('-') {
            return match split_decimal(rest) {
                Some(_) => Err(AmountError::Negative),
                None => Err(AmountError::Unparsable),
            };
        }
        let (int_part, frac_part) = split_decimal(amount).ok_or(AmountError::Unparsable)?;

        let kept = &frac_part[..frac_part.len().min(decimals as usize)];
        let int_value = parse_digits(int_part)?;
        let frac_value = parse_digits(kept)?;

        let int_units = if int_value == 0 {
            0
        } else {
            10u128
                .checked_pow(decimals as u32)
                .and_then(|scale| int_value.checked_mul(scale))
                .ok_or(AmountError::Overflow)?
        };
        let frac_units = if frac_value == 0 {
            0
        } else {
            10u128
                .checked_pow((decimals as usize - kept.len()) as u32)
                .and_then(|scale| frac_value.checked_mul(scale))
                .ok_or(AmountError::Overflow)?
        };
        let total = int_units.checked_add(frac_units).ok_or(AmountError::Overflow)?;
        let units = u64::try_from(total).map_err(|_| AmountError::Overflow)?;

        Ok(Self { units, decimals })
    }

    #[inline]
    pub fn units(&self) -> u64 {
        self.units
    }

    #[inline]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }
}

impl fmt::Display for SwapAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.units.to_string();
        let decimals = self.decimals as usize;
        if decimals == 0 {
            return f.write_str(&digits);
        }
        let padded = format!("{:0>width$}", digits, width = decimals + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            f.write_str(int_part)
        } else {
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

/// Split `"12.5"` into `("12", "5")`, rejecting anything that is not plain
/// decimal notation with at least one digit.
fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    Some((int_part, frac_part))
}

fn parse_digits(digits: &str) -> Result<u128, AmountError> {
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    significant.parse::<u128>().map_err(|_| AmountError::Overflow)
}

/// Validate a requested swap.
///
/// `from_holding` is the wallet's holding of the source token; a holding for
/// another mint counts as no holding. Checks run in order: both sides
/// selected, distinct tokens, positive amount, sufficient balance.
pub fn validate_swap(
    from_mint: Option<&Pubkey>,
    to_mint: Option<&Pubkey>,
    from_holding: Option<&TokenHolding>,
    amount: &str,
) -> Result<SwapAmount, ValidationError> {
    let (Some(from_mint), Some(to_mint)) = (from_mint, to_mint) else {
        return Err(ValidationError::MissingSelection);
    };
    if from_mint == to_mint {
        return Err(ValidationError::SameToken);
    }
    let Some(holding) = from_holding.filter(|h| h.mint == *from_mint) else {
        return Err(ValidationError::MissingSelection);
    };

    let insufficient =
        || ValidationError::InsufficientBalance { identifier: holding.identifier.clone() };
    match SwapAmount::parse(amount, holding.decimals) {
        Err(AmountError::Unparsable | AmountError::Negative) => {
            Err(ValidationError::NonPositiveAmount)
        }
        Err(AmountError::Overflow) => Err(insufficient()),
        Ok(parsed) if parsed.is_zero() => Err(ValidationError::NonPositiveAmount),
        Ok(parsed) if parsed.units() > holding.raw_balance => Err(insufficient()),
        Ok(parsed) => Ok(parsed),
    }
}
