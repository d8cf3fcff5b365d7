//! Unit conversion between wei, gwei and ETH.
//!
//! Every conversion is done on 256-bit integers. Values never pass through a
//! floating point type, so amounts up to `2^256 - 1` wei convert exactly.

use alloy_primitives::U256;
use thiserror::Error;

/// Number of fraction digits in one ETH.
pub const ETH_DECIMALS: usize = 18;
/// Number of fraction digits in one gwei.
pub const GWEI_DECIMALS: usize = 9;

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;
/// One hundredth of a gwei, the resolution of [`format_gas_price_gwei`].
const WEI_PER_CENTI_GWEI: u64 = 10_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("too many decimal places: {0} (max {ETH_DECIMALS})")]
    TooPrecise(usize),

    #[error("value overflows 256 bits")]
    Overflow,
}

/// Parses an unsigned amount given as decimal (`"1000"`) or hex (`"0x3e8"`).
pub fn parse_wei(raw: &str) -> Result<U256, UnitError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => {
            if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(UnitError::InvalidNumber(raw.to_string()));
            }
            U256::from_str_radix(hex_digits, 16)
        }
        None => {
            if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(UnitError::InvalidNumber(raw.to_string()));
            }
            U256::from_str_radix(trimmed, 10)
        }
    };
    parsed.map_err(|_| UnitError::Overflow)
}

/// Renders wei as a decimal ETH string.
///
/// The fraction is always present, trimmed of trailing zeros down to a single
/// digit: `0 -> "0.0"`, `10^18 -> "1.0"`, `1 -> "0.000000000000000001"`.
pub fn wei_to_eth(wei: U256) -> String {
    let scale = U256::from(WEI_PER_ETH);
    let whole = wei / scale;
    let fraction = wei % scale;

    let padded = format!("{:0>width$}", fraction.to_string(), width = ETH_DECIMALS);
    let trimmed = padded.trim_end_matches('0');
    let fraction_digits = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{}.{}", whole, fraction_digits)
}

/// Parses a decimal ETH amount back into wei. Exact inverse of [`wei_to_eth`].
pub fn eth_to_wei(eth: &str) -> Result<U256, UnitError> {
    let trimmed = eth.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
    {
        return Err(UnitError::InvalidNumber(eth.to_string()));
    }
    if fraction.len() > ETH_DECIMALS {
        return Err(UnitError::TooPrecise(fraction.len()));
    }

    let whole_wei = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)
            .map_err(|_| UnitError::Overflow)?
            .checked_mul(U256::from(WEI_PER_ETH))
            .ok_or(UnitError::Overflow)?
    };

    let fraction_wei = if fraction.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", fraction, width = ETH_DECIMALS);
        U256::from_str_radix(&padded, 10).map_err(|_| UnitError::Overflow)?
    };

    whole_wei
        .checked_add(fraction_wei)
        .ok_or(UnitError::Overflow)
}

/// Renders a gas price in gwei with exactly two decimals, rounded half up.
pub fn format_gas_price_gwei(wei: U256) -> String {
    let step = U256::from(WEI_PER_CENTI_GWEI);
    let mut centi_gwei = wei / step;
    // remainder * 2 cannot overflow: remainder < 10^7
    if (wei % step) * U256::from(2u64) >= step {
        centi_gwei += U256::from(1u64);
    }

    let hundred = U256::from(100u64);
    let whole = centi_gwei / hundred;
    let cents = centi_gwei % hundred;
    format!("{}.{:0>2} Gwei", whole, cents.to_string())
}

/// Transaction fee in ETH, computed as an exact `gas_price * gas_used` product.
pub fn calculate_fee(gas_price: U256, gas_used: U256) -> Result<String, UnitError> {
    let fee = gas_price
        .checked_mul(gas_used)
        .ok_or(UnitError::Overflow)?;
    Ok(wei_to_eth(fee))
}
