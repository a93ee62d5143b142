//! Deterministic ABI codec for the meta-transaction client.
//!
//! This crate implements the word-aligned contract ABI encoding used when a
//! call is packed for off-chain authorization: function selector derivation,
//! encoding of typed argument lists into 32-byte words, and the exact inverse
//! decoding. All functions are pure; encoding the same input twice yields
//! identical bytes.

use thiserror::Error;

pub mod codec;
pub mod method;
pub mod types;

pub use codec::{decode_parameters, encode_bytes, encode_parameters, encode_selector};
pub use method::MethodDescriptor;
pub use types::{AbiType, AbiValue};

/// Errors that can occur while encoding or decoding ABI data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
	/// Error that occurs when a type tag is not part of the supported set.
	#[error("unsupported ABI type tag: {0}")]
	UnsupportedType(String),
	/// Error that occurs when the input ends before a complete value was read.
	#[error("input truncated while decoding ABI data")]
	DecodeTruncated,
	/// Error that occurs when a value does not fit its declared width.
	#[error("value out of range for {0}")]
	ValueOutOfRange(String),
	/// Error that occurs when the value count differs from the type count.
	#[error("expected {expected} values, got {actual}")]
	ArityMismatch { expected: usize, actual: usize },
	/// Error that occurs when a value's kind differs from its declared type.
	#[error("value of kind {actual} does not match declared type {expected}")]
	TypeMismatch { expected: String, actual: String },
	/// Error that occurs when a method signature string cannot be parsed.
	#[error("malformed method signature: {0}")]
	InvalidMethodSignature(String),
}
