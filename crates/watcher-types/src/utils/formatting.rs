//! String formatting utilities.
//!
//! Hex prefix handling, log-friendly truncation, and exact decimal rendering
//! of integer token amounts.

/// Truncates a long identifier for log output.
///
/// Keeps the first 8 characters followed by "..".
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Adds a "0x" prefix to a hex string unless one is already present.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders a raw integer amount shifted right by `decimals` places.
///
/// Works on the decimal digits directly so no precision is lost for any
/// amount size. The output is plain fixed-point notation without exponent,
/// leading zeros, or trailing fractional zeros ("2000000000000000" at 18
/// decimals renders "0.002").
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	let digits = amount.trim_start_matches('0');
	if digits.is_empty() {
		return "0".to_string();
	}

	let places = decimals as usize;
	let (integer_part, fraction_part) = if digits.len() > places {
		digits.split_at(digits.len() - places)
	} else {
		("0", digits)
	};

	let fraction = format!("{:0>width$}", fraction_part, width = places);
	let fraction = fraction.trim_end_matches('0');

	if fraction.is_empty() {
		integer_part.to_string()
	} else {
		format!("{}.{}", integer_part, fraction)
	}
}
