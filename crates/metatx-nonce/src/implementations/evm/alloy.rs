//! Chain-state reader backed by the verifying contract's view state.
//!
//! Reads `getNonce(address)` from the verifying contract over JSON-RPC
//! using an Alloy HTTP provider.

use crate::{NonceError, NonceSource};
use alloy_primitives::Address;
use alloy_provider::RootProvider;
use alloy_sol_types::sol;
use alloy_transport_http::Http;
use async_trait::async_trait;

sol! {
	#[sol(rpc)]
	interface IMetaTxVerifier {
		function getNonce(address signer) external view returns (uint256);
	}
}

/// Nonce source reading the verifying contract over an RPC endpoint.
pub struct AlloyNonceSource {
	provider: RootProvider<Http<reqwest::Client>>,
	verifying_contract: Address,
}

impl AlloyNonceSource {
	/// Creates a source for the given RPC endpoint and verifying contract.
	pub fn new(rpc_url: &str, verifying_contract: Address) -> Result<Self, NonceError> {
		let provider = RootProvider::new_http(
			rpc_url
				.parse()
				.map_err(|e| NonceError::Unavailable(format!("invalid RPC URL: {}", e)))?,
		);
		Ok(Self {
			provider,
			verifying_contract,
		})
	}
}

#[async_trait]
impl NonceSource for AlloyNonceSource {
	async fn get_nonce(&self, account: Address) -> Result<u64, NonceError> {
		let verifier = IMetaTxVerifier::new(self.verifying_contract, &self.provider);

		let result = verifier
			.getNonce(account)
			.call()
			.await
			.map_err(|e| NonceError::Unavailable(format!("getNonce call failed: {}", e)))?;

		let nonce = u64::try_from(result._0)
			.map_err(|_| NonceError::Unavailable("nonce exceeds u64 range".to_string()))?;

		tracing::trace!(account = %account, nonce, "read authoritative nonce");
		Ok(nonce)
	}
}
