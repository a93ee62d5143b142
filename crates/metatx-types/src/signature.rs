//! Decomposition of raw signing results into their canonical components.

use crate::utils::encode_0x;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a raw ECDSA signing result: r (32) || s (32) || v (1).
pub const RAW_SIGNATURE_LEN: usize = 65;

/// Errors produced while decomposing a raw signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
	/// Error that occurs when the raw input is not exactly 65 bytes.
	#[error("malformed signature: expected 65 bytes, got {0}")]
	MalformedSignature(usize),
}

/// A decomposed secp256k1 signature.
///
/// Never constructed field-by-field by callers; always derived from the
/// opaque 65-byte result an external signer returns, via [`Signature::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
	/// First 32 bytes of the raw result.
	pub r: B256,
	/// Second 32 bytes of the raw result.
	pub s: B256,
	/// Final byte, read directly as an unsigned integer. No recovery-id
	/// normalization is applied; the relayer receives the byte as signed.
	pub v: u8,
}

impl Signature {
	/// Splits a 65-byte signing result into r, s and v.
	pub fn from_raw(raw: &[u8]) -> Result<Self, SignatureError> {
		if raw.len() != RAW_SIGNATURE_LEN {
			return Err(SignatureError::MalformedSignature(raw.len()));
		}
		Ok(Self {
			r: B256::from_slice(&raw[0..32]),
			s: B256::from_slice(&raw[32..64]),
			v: raw[64],
		})
	}

	/// Hex representation of `r` with a `0x` prefix, as sent on the wire.
	pub fn r_hex(&self) -> String {
		encode_0x(self.r.as_slice())
	}

	/// Hex representation of `s` with a `0x` prefix, as sent on the wire.
	pub fn s_hex(&self) -> String {
		encode_0x(self.s.as_slice())
	}
}
