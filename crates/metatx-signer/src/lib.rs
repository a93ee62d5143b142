//! Signer capability for the meta-transaction client.
//!
//! The authorization flow never touches key material; it hands a complete
//! typed-data document to an opaque signer capability and receives a raw
//! 65-byte result back. This crate defines that capability as a trait and
//! provides two implementations: an in-process key signer (tests and
//! tooling) and a JSON-RPC wallet endpoint speaking `eth_signTypedData_v4`.
//!
//! No timeout is imposed on signer calls: a wallet may legitimately wait
//! for user interaction indefinitely.

use alloy_primitives::Address;
use async_trait::async_trait;
use metatx_types::{Signature, TypedDataDocument};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
	pub mod rpc;
}

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SignerError {
	/// The account holder refused to sign. A normal, expected outcome,
	/// deliberately distinct from any transport or signing failure.
	#[error("signing declined by the account holder")]
	Declined,
	/// Error that occurs when the signing operation itself fails.
	#[error("signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs while talking to an external signer endpoint.
	#[error("signer transport error: {0}")]
	Transport(String),
	/// Error that occurs when the signer does not hold the requested account.
	#[error("account {0} is not available to this signer")]
	UnknownAccount(Address),
}

/// Trait defining the external signer capability.
///
/// Implementations receive the whole signable document and perform domain
/// separation hashing and struct hashing internally, per the v4 variant of
/// the structured-data signing algorithm. The returned signature is always
/// the decomposition of the raw 65-byte signing result.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Signs a typed-data document on behalf of the given account.
	async fn sign_typed_data(
		&self,
		account: Address,
		document: &TypedDataDocument,
	) -> Result<Signature, SignerError>;
}

/// Service that manages signing operations.
///
/// Wraps an underlying signer implementation behind a uniform interface,
/// the way the rest of the client consumes it.
pub struct SignerService {
	/// The underlying signer implementation.
	implementation: Box<dyn SignerInterface>,
}

impl SignerService {
	/// Creates a new SignerService with the specified implementation.
	pub fn new(implementation: Box<dyn SignerInterface>) -> Self {
		Self { implementation }
	}

	/// Signs a typed-data document using the managed signer.
	pub async fn sign_typed_data(
		&self,
		account: Address,
		document: &TypedDataDocument,
	) -> Result<Signature, SignerError> {
		self.implementation.sign_typed_data(account, document).await
	}
}
