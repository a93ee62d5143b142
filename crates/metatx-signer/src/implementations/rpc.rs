//! Wallet signer reached over JSON-RPC.
//!
//! Sends the whole typed-data document to a wallet endpoint via
//! `eth_signTypedData_v4` and decomposes the returned 65-byte result. The
//! standard user-rejection error code maps to [`SignerError::Declined`] so
//! callers can tell a refusal apart from a transport failure.
//!
//! The HTTP client carries no request timeout: the wallet may block on
//! user interaction for as long as the user takes.

use crate::{SignerError, SignerInterface};
use alloy_primitives::Address;
use async_trait::async_trait;
use metatx_types::{without_0x_prefix, Signature, TypedDataDocument};
use serde::{Deserialize, Serialize};

/// Error code wallets return when the user rejects a signing request.
const USER_REJECTED_CODE: i64 = 4001;

/// Signer implementation that forwards documents to a wallet RPC endpoint.
pub struct RpcWalletSigner {
	client: reqwest::Client,
	endpoint: String,
}

#[derive(Serialize)]
struct JsonRpcRequest {
	jsonrpc: &'static str,
	id: u64,
	method: &'static str,
	// (signer address, document serialized as a JSON string)
	params: (String, String),
}

#[derive(Deserialize)]
struct JsonRpcResponse {
	result: Option<String>,
	error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
	code: i64,
	message: String,
}

impl RpcWalletSigner {
	/// Creates a signer talking to the given wallet RPC endpoint.
	pub fn new(endpoint: String) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
		}
	}
}

fn map_rpc_error(error: JsonRpcError) -> SignerError {
	if error.code == USER_REJECTED_CODE {
		SignerError::Declined
	} else {
		SignerError::SigningFailed(format!("wallet error {}: {}", error.code, error.message))
	}
}

#[async_trait]
impl SignerInterface for RpcWalletSigner {
	async fn sign_typed_data(
		&self,
		account: Address,
		document: &TypedDataDocument,
	) -> Result<Signature, SignerError> {
		let payload = serde_json::to_string(document)
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;
		let request = JsonRpcRequest {
			jsonrpc: "2.0",
			id: 1,
			method: "eth_signTypedData_v4",
			params: (account.to_checksum(None), payload),
		};

		tracing::debug!(account = %account, endpoint = %self.endpoint, "requesting wallet signature");

		let response = self
			.client
			.post(&self.endpoint)
			.json(&request)
			.send()
			.await
			.map_err(|e| SignerError::Transport(e.to_string()))?;

		let body: JsonRpcResponse = response
			.json()
			.await
			.map_err(|e| SignerError::Transport(e.to_string()))?;

		if let Some(error) = body.error {
			return Err(map_rpc_error(error));
		}
		let result = body
			.result
			.ok_or_else(|| SignerError::SigningFailed("empty wallet response".to_string()))?;

		let raw = hex::decode(without_0x_prefix(&result))
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;
		Signature::from_raw(&raw).map_err(|e| SignerError::SigningFailed(e.to_string()))
	}
}
