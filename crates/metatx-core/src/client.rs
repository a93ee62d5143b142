//! Wiring of a ready-to-use authorization flow from configuration.
//!
//! The builder assembles the default implementations (HTTP relay client,
//! contract-backed nonce source) from the loaded configuration. The signer
//! capability is always supplied by the caller since key custody is
//! external; the other seams accept overrides for tests and alternative
//! transports.

use crate::flow::AuthorizationFlow;
use crate::registry::MethodRegistry;
use crate::AuthorizationError;
use metatx_config::Config;
use metatx_nonce::implementations::evm::alloy::AlloyNonceSource;
use metatx_nonce::{NonceSequencer, NonceSource};
use metatx_relay::{HttpRelayClient, RelayInterface, RelayService};
use metatx_signer::{SignerInterface, SignerService};
use std::sync::Arc;

/// Builder assembling an [`AuthorizationFlow`] from configuration.
pub struct ClientBuilder {
	config: Config,
	registry: MethodRegistry,
	signer: Option<Box<dyn SignerInterface>>,
	nonce_source: Option<Arc<dyn NonceSource>>,
	relay: Option<Box<dyn RelayInterface>>,
}

impl std::fmt::Debug for ClientBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientBuilder")
			.field("config", &self.config)
			.field("registry", &self.registry)
			.finish_non_exhaustive()
	}
}

impl ClientBuilder {
	/// Creates a builder over a validated configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			registry: MethodRegistry::new(),
			signer: None,
			nonce_source: None,
			relay: None,
		}
	}

	/// Registers an authorizable method by its canonical signature.
	pub fn register_method(mut self, signature: &str) -> Result<Self, AuthorizationError> {
		self.registry.register_signature(signature)?;
		Ok(self)
	}

	/// Supplies the signer capability. Required.
	pub fn with_signer(mut self, signer: Box<dyn SignerInterface>) -> Self {
		self.signer = Some(signer);
		self
	}

	/// Overrides the authoritative nonce source.
	pub fn with_nonce_source(mut self, source: Arc<dyn NonceSource>) -> Self {
		self.nonce_source = Some(source);
		self
	}

	/// Overrides the relay transport.
	pub fn with_relay(mut self, relay: Box<dyn RelayInterface>) -> Self {
		self.relay = Some(relay);
		self
	}

	/// Assembles the flow, constructing default implementations for any
	/// seam that was not overridden.
	pub fn build(self) -> Result<AuthorizationFlow, AuthorizationError> {
		let domain = self
			.config
			.domain
			.descriptor()
			.map_err(|e| AuthorizationError::Configuration(e.to_string()))?;

		let signer = self.signer.ok_or_else(|| {
			AuthorizationError::Configuration("no signer capability provided".to_string())
		})?;

		let nonce_source = match self.nonce_source {
			Some(source) => source,
			None => Arc::new(AlloyNonceSource::new(
				&self.config.network.rpc_url,
				domain.verifying_contract,
			)?),
		};

		let relay = match self.relay {
			Some(relay) => relay,
			None => Box::new(
				HttpRelayClient::new(self.config.relay.url.clone(), self.config.relay.timeout())
					.map_err(|e| AuthorizationError::Configuration(e.to_string()))?,
			),
		};

		Ok(AuthorizationFlow::new(
			domain,
			self.registry,
			Arc::new(SignerService::new(signer)),
			Arc::new(NonceSequencer::new(nonce_source)),
			Arc::new(RelayService::new(relay)),
		))
	}
}
