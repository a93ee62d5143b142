//! Configuration for the meta-transaction client.
//!
//! Loads the static deployment facts from a TOML file: the signing domain
//! (which must match the verifying contract byte-for-byte), the relay
//! endpoint and its timeout, and the RPC endpoint used to read the
//! contract's nonce state. Everything here is immutable per deployment.

use alloy_primitives::{Address, B256};
use metatx_types::DomainDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Signing domain of the verifying contract.
	pub domain: DomainConfig,
	/// Relay service endpoint.
	pub relay: RelayConfig,
	/// Chain access used for authoritative nonce reads.
	pub network: NetworkConfig,
}

/// Signing-domain section, mirrored on-chain by the verifying contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	/// Application name bound into every signature.
	pub name: String,
	/// Domain version string.
	pub version: String,
	/// Chain the verifying contract is deployed on.
	pub chain_id: u64,
	/// Verifying contract address, 0x-prefixed hex.
	pub verifying_contract: String,
	/// Deployment salt, 32 bytes of 0x-prefixed hex.
	pub salt: String,
}

/// Relay endpoint section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
	/// URL the authorized package is POSTed to.
	pub url: String,
	/// Request timeout for relay submissions, in seconds.
	/// Defaults to 30 seconds if not specified.
	#[serde(default = "default_relay_timeout_seconds")]
	pub timeout_seconds: u64,
}

/// Returns the default relay submission timeout in seconds.
fn default_relay_timeout_seconds() -> u64 {
	30
}

/// Chain access section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// JSON-RPC endpoint used to read the verifying contract's state.
	pub rpc_url: String,
}

impl Config {
	/// Loads and validates a configuration file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.domain.name.is_empty() || self.domain.version.is_empty() {
			return Err(ConfigError::Validation(
				"domain name and version must be non-empty".to_string(),
			));
		}
		if self.domain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"domain chain_id must be non-zero".to_string(),
			));
		}
		self.domain.descriptor()?;
		if !self.relay.url.starts_with("http://") && !self.relay.url.starts_with("https://") {
			return Err(ConfigError::Validation(format!(
				"relay url must be http(s): {}",
				self.relay.url
			)));
		}
		if self.relay.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"relay timeout_seconds must be non-zero".to_string(),
			));
		}
		if self.network.rpc_url.is_empty() {
			return Err(ConfigError::Validation(
				"network rpc_url must be non-empty".to_string(),
			));
		}
		Ok(())
	}
}

impl DomainConfig {
	/// Builds the typed domain descriptor used by the signing flow.
	pub fn descriptor(&self) -> Result<DomainDescriptor, ConfigError> {
		let verifying_contract: Address = self.verifying_contract.parse().map_err(|_| {
			ConfigError::Validation(format!(
				"invalid verifying_contract address: {}",
				self.verifying_contract
			))
		})?;
		let salt: B256 = self
			.salt
			.parse()
			.map_err(|_| ConfigError::Validation(format!("invalid 32-byte salt: {}", self.salt)))?;

		Ok(DomainDescriptor {
			name: self.name.clone(),
			version: self.version.clone(),
			chain_id: self.chain_id,
			verifying_contract,
			salt,
		})
	}
}

impl RelayConfig {
	/// The submission timeout as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_seconds)
	}
}
