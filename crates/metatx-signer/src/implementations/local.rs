//! In-process signer backed by a local private key.
//!
//! Computes the v4 digest of the document itself and signs the resulting
//! hash. Used by tests and operational tooling; production flows normally
//! go through a wallet via the rpc implementation.

use crate::{SignerError, SignerInterface};
use alloy_dyn_abi::TypedData;
use alloy_primitives::Address;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use metatx_types::{Signature, TypedDataDocument};
use std::str::FromStr;

/// Signer implementation holding an in-process private key.
pub struct LocalSigner {
	signer: PrivateKeySigner,
}

impl LocalSigner {
	/// Creates a local signer from an existing key.
	pub fn new(signer: PrivateKeySigner) -> Self {
		Self { signer }
	}

	/// Creates a local signer from a hex-encoded private key.
	pub fn from_hex_key(key: &str) -> Result<Self, SignerError> {
		let signer =
			PrivateKeySigner::from_str(key).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
		Ok(Self { signer })
	}

	/// The address this signer can sign for.
	pub fn address(&self) -> Address {
		self.signer.address()
	}
}

#[async_trait]
impl SignerInterface for LocalSigner {
	async fn sign_typed_data(
		&self,
		account: Address,
		document: &TypedDataDocument,
	) -> Result<Signature, SignerError> {
		if account != self.signer.address() {
			return Err(SignerError::UnknownAccount(account));
		}

		// Same v4 hashing a wallet performs: domain hash, struct hash,
		// 0x1901-prefixed digest.
		let value = serde_json::to_value(document)
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;
		let typed: TypedData = serde_json::from_value(value)
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;
		let digest = typed
			.eip712_signing_hash()
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;

		let raw = self
			.signer
			.sign_hash_sync(&digest)
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;

		Signature::from_raw(&raw.as_bytes())
			.map_err(|e| SignerError::SigningFailed(e.to_string()))
	}
}
