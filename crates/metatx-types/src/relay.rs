//! Wire types for the relay HTTP contract.
//!
//! The request is fully self-describing: together with the static domain
//! configuration the relayer reconstructs and re-verifies the exact
//! typed-data hash the user signed before submitting on-chain.

use crate::signature::Signature;
use crate::utils::encode_0x;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// The authorized package sent to the relay endpoint.
///
/// Field names and formats follow the relayer's JSON contract exactly:
/// 0x-prefixed hex strings for byte values, integers for `v` and `nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
	/// Target contract that verifies and dispatches the call.
	#[serde(rename = "contractAddress")]
	pub contract_address: String,
	/// Account that produced the authorizing signature.
	pub signer: String,
	/// 4-byte function selector, hex encoded.
	pub method: String,
	/// Packed argument bytes, hex encoded.
	pub param: String,
	/// Signature component r.
	pub r: String,
	/// Signature component s.
	pub s: String,
	/// Signature recovery byte.
	pub v: u8,
	/// Authorization sequence number consumed by the verifying contract.
	pub nonce: u64,
}

impl RelayRequest {
	/// Packages the authorized call for transmission.
	pub fn new(
		contract_address: Address,
		signer: Address,
		selector: [u8; 4],
		params: &[u8],
		signature: &Signature,
		nonce: u64,
	) -> Self {
		Self {
			contract_address: contract_address.to_checksum(None),
			signer: signer.to_checksum(None),
			method: encode_0x(&selector),
			param: encode_0x(params),
			r: signature.r_hex(),
			s: signature.s_hex(),
			v: signature.v,
			nonce,
		}
	}
}

/// Fields the relay service may return in a response body.
///
/// Only the transaction hash on success is promised by the contract; the
/// failure-body shape is provisional, so every field is optional and the
/// caller falls back to the raw body text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayResponseBody {
	/// Transaction hash of the submitted meta-transaction.
	pub hash: Option<String>,
	/// Alternative spelling some relayers use.
	#[serde(rename = "txHash")]
	pub tx_hash: Option<String>,
	/// Application-level error payload.
	pub error: Option<serde_json::Value>,
	/// Human-readable diagnostic.
	pub message: Option<String>,
}

impl RelayResponseBody {
	/// The transaction hash, whichever field it arrived under.
	pub fn transaction_hash(&self) -> Option<&str> {
		self.hash.as_deref().or(self.tx_hash.as_deref())
	}
}
