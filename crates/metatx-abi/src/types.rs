//! Type tags and value representations for the ABI codec.

use crate::AbiError;
use alloy_primitives::{Address, U256};
use std::fmt;

/// Parsed ABI type tag.
///
/// Covers the types the meta-transaction protocol encodes: addresses,
/// fixed-width unsigned integers, booleans, fixed-size byte arrays and
/// dynamic byte strings. Tags follow the canonical signature spelling,
/// so `uint256` rather than `uint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
	/// 20-byte account or contract address.
	Address,
	/// Unsigned integer of the given bit width (8..=256, multiple of 8).
	Uint(usize),
	/// Boolean, encoded as a full word holding 0 or 1.
	Bool,
	/// Fixed-size byte array of the given length (1..=32).
	FixedBytes(usize),
	/// Dynamically sized byte string.
	Bytes,
}

impl AbiType {
	/// Parses a canonical type tag string such as `address` or `uint256`.
	pub fn parse(tag: &str) -> Result<Self, AbiError> {
		match tag {
			"address" => return Ok(Self::Address),
			"bool" => return Ok(Self::Bool),
			"bytes" => return Ok(Self::Bytes),
			_ => {}
		}
		if let Some(width) = tag.strip_prefix("uint") {
			let bits: usize = width
				.parse()
				.map_err(|_| AbiError::UnsupportedType(tag.to_string()))?;
			if bits == 0 || bits > 256 || bits % 8 != 0 {
				return Err(AbiError::UnsupportedType(tag.to_string()));
			}
			return Ok(Self::Uint(bits));
		}
		if let Some(len) = tag.strip_prefix("bytes") {
			let n: usize = len
				.parse()
				.map_err(|_| AbiError::UnsupportedType(tag.to_string()))?;
			if n == 0 || n > 32 {
				return Err(AbiError::UnsupportedType(tag.to_string()));
			}
			return Ok(Self::FixedBytes(n));
		}
		Err(AbiError::UnsupportedType(tag.to_string()))
	}

	/// Returns true for types encoded through the head/tail convention.
	pub fn is_dynamic(&self) -> bool {
		matches!(self, Self::Bytes)
	}
}

impl fmt::Display for AbiType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Address => write!(f, "address"),
			Self::Uint(bits) => write!(f, "uint{}", bits),
			Self::Bool => write!(f, "bool"),
			Self::FixedBytes(n) => write!(f, "bytes{}", n),
			Self::Bytes => write!(f, "bytes"),
		}
	}
}

/// A typed argument value accepted by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
	/// 20-byte address value.
	Address(Address),
	/// Unsigned integer value, range-checked against the declared width.
	Uint(U256),
	/// Boolean value.
	Bool(bool),
	/// Fixed-size byte array; length must equal the declared size.
	FixedBytes(Vec<u8>),
	/// Dynamic byte string.
	Bytes(Vec<u8>),
}

impl AbiValue {
	/// Short description of the value's kind, used in mismatch errors.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Address(_) => "address",
			Self::Uint(_) => "uint",
			Self::Bool(_) => "bool",
			Self::FixedBytes(_) => "fixed bytes",
			Self::Bytes(_) => "bytes",
		}
	}
}
