//! Address and hash helpers.
//!
//! Ledger identifiers arrive in mixed case (EIP-55 checksums, user input).
//! All comparisons go through [`normalize_address`].

/// Hex digits in a 20-byte account address.
const ADDRESS_HEX_LEN: usize = 40;
/// Hex digits in a 32-byte transaction hash.
const HASH_HEX_LEN: usize = 64;

/// Lowercase, `0x`-prefixed form of an address. Length is not checked.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", body.to_ascii_lowercase())
}

pub fn addresses_equal(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    match value.strip_prefix("0x") {
        Some(body) => body.len() == digits && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// `0x` followed by exactly 64 hex digits.
pub fn is_tx_hash(value: &str) -> bool {
    is_prefixed_hex(value, HASH_HEX_LEN)
}

/// `0x` followed by exactly 40 hex digits, in any case.
pub fn is_address(value: &str) -> bool {
    is_prefixed_hex(value, ADDRESS_HEX_LEN)
}

/// Display form `0x1234...abcd`. Short inputs are returned unchanged.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
