//! Hex string formatting helpers.
//!
//! The relay wire contract and the typed-data document both carry byte
//! values as 0x-prefixed hex strings; these helpers keep that formatting
//! in one place.

/// Encodes bytes as a lowercase hex string with a `0x` prefix.
pub fn encode_0x(data: &[u8]) -> String {
	format!("0x{}", hex::encode(data))
}

/// Ensures a hex string carries the `0x` prefix, adding it when absent.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading `0x`/`0X` prefix from a hex string when present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
