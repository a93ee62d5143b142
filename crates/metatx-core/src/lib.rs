//! Authorization flow orchestration for the meta-transaction client.
//!
//! Wires the components into the one sequence the protocol allows: reserve
//! a nonce, encode the call, build the signable document, obtain a
//! signature from the external signer capability, and hand the authorized
//! package to the relay. Methods are registered as descriptor/schema pairs
//! in a [`MethodRegistry`]; adding a contract method never duplicates flow
//! logic.

use alloy_primitives::Address;
use metatx_abi::AbiError;
use metatx_nonce::NonceError;
use metatx_signer::SignerError;
use metatx_types::{RelayRequest, SignatureError, TypedDataError};
use thiserror::Error;

pub mod client;
pub mod flow;
pub mod packet;
pub mod registry;

pub use client::ClientBuilder;
pub use flow::{Authorization, AuthorizationFlow};
pub use packet::{packet_message, packet_schema, PACKET_TYPE_NAME};
pub use registry::MethodRegistry;

/// Errors surfaced by the authorization flow.
///
/// Encoding and schema errors indicate a broken call descriptor and are
/// never retried. A declined signing request is a normal outcome with its
/// own variant. Relay errors carry the original request so the caller can
/// inspect it or decide to retry.
#[derive(Debug, Error)]
pub enum AuthorizationError {
	/// Error that occurs while encoding the call's arguments.
	#[error("encoding error: {0}")]
	Encoding(#[from] AbiError),
	/// Error that occurs while assembling the typed-data document.
	#[error("schema error: {0}")]
	Schema(#[from] TypedDataError),
	/// Error that occurs when the raw signing result is malformed.
	#[error("signature error: {0}")]
	Signature(#[from] SignatureError),
	/// The account holder refused to sign. Expected, not a failure of the
	/// machinery.
	#[error("authorization declined by the account holder")]
	Declined,
	/// Error that occurs inside the signer capability.
	#[error("signer error: {0}")]
	Signer(SignerError),
	/// Error that occurs during nonce sequencing.
	#[error("nonce error: {0}")]
	Nonce(#[from] NonceError),
	/// The relay kept rejecting the nonce after a reconciliation; manual
	/// intervention is needed rather than another silent loop.
	#[error("nonce persistently stale for account {account}")]
	NonceStale { account: Address },
	/// Error that occurs while wiring the client from configuration.
	#[error("client configuration error: {0}")]
	Configuration(String),
	/// Error that occurs when a method was never registered.
	#[error("unknown method: {0}")]
	UnknownMethod(String),
	/// Error that occurs when a method name is registered twice.
	#[error("method already registered: {0}")]
	DuplicateMethod(String),
	/// The relay answered but refused the package.
	#[error("relay rejected authorization (HTTP {status}): {reason}")]
	RelayRejected {
		status: u16,
		reason: String,
		request: Box<RelayRequest>,
	},
	/// No response was obtained from the relay endpoint.
	#[error("relay unreachable: {reason}")]
	RelayUnreachable {
		reason: String,
		request: Box<RelayRequest>,
	},
}

impl From<SignerError> for AuthorizationError {
	fn from(err: SignerError) -> Self {
		match err {
			SignerError::Declined => AuthorizationError::Declined,
			other => AuthorizationError::Signer(other),
		}
	}
}
