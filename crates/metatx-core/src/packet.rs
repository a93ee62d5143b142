//! The fixed message type every authorization signs.
//!
//! Whatever the target method, the signed struct is always a `Packet`
//! carrying the 4-byte selector, the packed argument bytes, and the nonce
//! that binds the signature to a single execution. The verifying contract
//! declares the identical struct, so this schema must never drift.

use metatx_types::{encode_0x, TypedField};
use serde_json::json;

/// Name of the message type declaration.
pub const PACKET_TYPE_NAME: &str = "Packet";

/// The ordered field schema of the `Packet` type.
pub fn packet_schema() -> Vec<TypedField> {
	vec![
		TypedField::new("method", "bytes4"),
		TypedField::new("params", "bytes"),
		TypedField::new("nonce", "uint256"),
	]
}

/// Builds the ordered message value for one authorization attempt.
///
/// Field order matches [`packet_schema`] exactly.
pub fn packet_message(
	selector: [u8; 4],
	params: &[u8],
	nonce: u64,
) -> Vec<(String, serde_json::Value)> {
	vec![
		("method".to_string(), json!(encode_0x(&selector))),
		("params".to_string(), json!(encode_0x(params))),
		("nonce".to_string(), json!(nonce)),
	]
}
