//! String formatting utilities.
//!
//! Hex prefix handling, key normalisation and display of raw token amounts.

use alloy_primitives::U256;

/// Adds a "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Cleans up a private key as it commonly appears in env files.
///
/// Every single or double quote character and surrounding whitespace are
/// removed and a missing "0x" prefix is added. Returns `None` when nothing is
/// left.
pub fn normalize_private_key(raw: &str) -> Option<String> {
	let unquoted = raw.replace(['"', '\''], "");
	let key = unquoted.trim();
	if key.is_empty() {
		return None;
	}
	Some(with_0x_prefix(key))
}

/// Formats a raw token amount with `decimals` places for logs, e.g. "15000" or "1.5".
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
	let digits = amount.to_string();
	if decimals == 0 {
		return digits;
	}

	let places = decimals as usize;
	let (integer_part, fraction) = if digits.len() <= places {
		("0".to_string(), format!("{:0>width$}", digits, width = places))
	} else {
		let split = digits.len() - places;
		(digits[..split].to_string(), digits[split..].to_string())
	};

	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, fraction)
	}
}
